//! Short-lived sessions with a Tuya smart plug.
//!
//! Each operation opens a fresh TCP connection, sends one frame, reads one
//! response, and closes the connection. This matches how the firmware
//! behaves with non-persistent clients and keeps the session model trivial:
//! there is no keepalive, no reconnect, and no retry.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

use crate::{
    commands,
    crypto::{self, KEY_LEN},
    error::Error,
    frame::{self, CommandType, Frame, HEADER_LEN, MAX_BODY_LEN},
    status::DeviceStatus,
};

/// Default TCP port for Tuya local control.
pub const DEFAULT_PORT: u16 = 6668;

/// Default connection and I/O timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Local protocol version spoken by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// Protocol 3.1: plaintext queries, MD5-signed control payloads.
    V31,
    /// Protocol 3.3: all payloads AES-128-ECB encrypted.
    #[default]
    V33,
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVersion::V31 => write!(f, "3.1"),
            ProtocolVersion::V33 => write!(f, "3.3"),
        }
    }
}

/// Configuration for connecting to a device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Device identifier from pairing.
    pub device_id: String,
    /// Device hostname or IP address.
    pub host: String,
    /// TCP port (typically 6668).
    pub port: u16,
    /// Local key from pairing (16 bytes).
    pub local_key: String,
    /// Protocol version (typically 3.3).
    pub version: ProtocolVersion,
    /// Connection and I/O timeout.
    pub timeout: Duration,
}

impl DeviceConfig {
    /// Creates a new device configuration with defaults for port, version,
    /// and timeout.
    pub fn new(
        device_id: impl Into<String>,
        host: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            local_key: local_key.into(),
            version: ProtocolVersion::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the protocol version.
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A smart plug controlled over the local network.
///
/// # Example
///
/// ```no_run
/// use tuya_core::{DeviceConfig, OutletDevice};
///
/// #[tokio::main]
/// async fn main() -> Result<(), tuya_core::Error> {
///     let config = DeviceConfig::new("bf0123abc", "192.168.1.50", "0123456789abcdef");
///     let mut device = OutletDevice::new(config)?;
///
///     let status = device.status().await?;
///     let on = status.switch_on().unwrap_or(false);
///     device.set_switch(!on).await?;
///     Ok(())
/// }
/// ```
pub struct OutletDevice {
    config: DeviceConfig,
    seq: u32,
}

impl OutletDevice {
    /// Creates a device handle, validating the local key length up front so
    /// a bad key fails before any network I/O.
    pub fn new(config: DeviceConfig) -> Result<Self, Error> {
        if config.local_key.len() != KEY_LEN {
            return Err(Error::Crypto(format!(
                "local key must be {} bytes, got {}",
                KEY_LEN,
                config.local_key.len()
            )));
        }
        Ok(Self { config, seq: 0 })
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Queries all data points.
    pub async fn status(&mut self) -> Result<DeviceStatus, Error> {
        let command = commands::dp_query(&self.config.device_id);
        let frame = self.roundtrip(CommandType::DpQuery, command.as_bytes()).await?;
        let payload = self.decode_payload(&frame.payload)?;
        DeviceStatus::from_payload(&payload)
    }

    /// Sets the relay state (on/off).
    pub async fn set_switch(&mut self, on: bool) -> Result<(), Error> {
        let command = commands::set_switch(&self.config.device_id, on);
        self.roundtrip(CommandType::Control, command.as_bytes())
            .await?;
        Ok(())
    }

    /// Wraps a command payload for the wire according to the protocol
    /// version.
    fn build_payload(&self, command: CommandType, data: &[u8]) -> Result<Vec<u8>, Error> {
        let key = self.config.local_key.as_bytes();
        match self.config.version {
            ProtocolVersion::V33 => {
                let encrypted = crypto::encrypt(key, data)?;
                if command == CommandType::DpQuery {
                    Ok(encrypted)
                } else {
                    // Non-query commands carry a plaintext version header:
                    // "3.3" followed by 12 zero bytes.
                    let mut payload = Vec::with_capacity(15 + encrypted.len());
                    payload.extend_from_slice(b"3.3");
                    payload.extend_from_slice(&[0u8; 12]);
                    payload.extend_from_slice(&encrypted);
                    Ok(payload)
                }
            }
            ProtocolVersion::V31 => {
                if command == CommandType::DpQuery {
                    // 3.1 queries go out in plaintext.
                    Ok(data.to_vec())
                } else {
                    let encrypted = crypto::encrypt(key, data)?;
                    let encoded = BASE64.encode(&encrypted);
                    let signature = crypto::sign_v31(key, &encoded);
                    let mut payload = Vec::with_capacity(3 + 16 + encoded.len());
                    payload.extend_from_slice(b"3.1");
                    payload.extend_from_slice(signature.as_bytes());
                    payload.extend_from_slice(encoded.as_bytes());
                    Ok(payload)
                }
            }
        }
    }

    /// Unwraps a response payload: strips the version header when present
    /// and decrypts unless the body is already plaintext JSON.
    fn decode_payload(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        if payload.is_empty() || payload.starts_with(b"{") {
            return Ok(payload.to_vec());
        }

        let body = if payload.len() > 15
            && (payload.starts_with(b"3.3") || payload.starts_with(b"3.1"))
        {
            &payload[15..]
        } else {
            payload
        };

        crypto::decrypt(self.config.local_key.as_bytes(), body)
    }

    /// Opens a connection, sends one frame, and reads the response frame.
    async fn roundtrip(&mut self, command: CommandType, data: &[u8]) -> Result<Frame, Error> {
        self.seq = self.seq.wrapping_add(1);
        let payload = self.build_payload(command, data)?;
        let request = frame::encode_request(self.seq, command, &payload);

        let addr = format!("{}:{}", self.config.host, self.config.port);
        debug!(addr = %addr, command = ?command, seq = self.seq, "connecting");

        let io_timeout = self.config.timeout;
        let mut stream = timeout(io_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout("connection timed out".into()))?
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;

        timeout(io_timeout, stream.write_all(&request))
            .await
            .map_err(|_| Error::Timeout("write timed out".into()))?
            .map_err(|e| Error::IoError(e.to_string()))?;

        // Read the 16-byte header first to learn the body length.
        let mut header = [0u8; HEADER_LEN];
        timeout(io_timeout, stream.read_exact(&mut header))
            .await
            .map_err(|_| Error::Timeout("read timed out; no response from device".into()))?
            .map_err(|e| Error::IoError(e.to_string()))?;

        let body_len = u32::from_be_bytes([header[12], header[13], header[14], header[15]]) as usize;
        if body_len > MAX_BODY_LEN {
            return Err(Error::Protocol(format!(
                "response too large: {} bytes",
                body_len
            )));
        }

        let mut body = vec![0u8; body_len];
        timeout(io_timeout, stream.read_exact(&mut body))
            .await
            .map_err(|_| Error::Timeout("read timed out".into()))?
            .map_err(|e| Error::IoError(e.to_string()))?;

        debug!(bytes = HEADER_LEN + body_len, "received response frame");

        let mut buf = header.to_vec();
        buf.extend_from_slice(&body);
        let frame = frame::decode_response(&buf)?;

        if let Some(code) = frame.return_code {
            if code != 0 {
                return Err(Error::DeviceError(format!(
                    "device returned error code {}",
                    code
                )));
            }
        }

        Ok(frame)
    }
}
