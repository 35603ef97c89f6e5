//! Core library for communicating with Tuya smart plugs over the local network.
//!
//! This crate implements the subset of the Tuya local control protocol needed
//! to read power-metering data points and toggle the relay on a paired smart
//! plug, without going through the vendor cloud.
//!
//! # Overview
//!
//! Tuya devices listen on TCP port 6668 for binary frames delimited by the
//! magic words `0x000055AA` / `0x0000AA55`. Frame payloads are JSON documents
//! encrypted with AES-128-ECB under the device's *local key* (a symmetric
//! secret established during pairing). Device state is exposed as a map of
//! numeric *data point* (DP) codes to values; a smart plug reports its relay
//! state on DP 1 and power-metering readings on DPs 18-20 and 101.
//!
//! # Example
//!
//! ```no_run
//! use tuya_core::{DeviceConfig, OutletDevice};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tuya_core::Error> {
//!     let config = DeviceConfig::new(
//!         "bf1234567890abcdef",
//!         "192.168.1.50",
//!         "0123456789abcdef",
//!     );
//!     let mut device = OutletDevice::new(config)?;
//!
//!     let status = device.status().await?;
//!     if let Some(on) = status.switch_on() {
//!         println!("Relay is {}", if on { "ON" } else { "OFF" });
//!     }
//!     if let Some(watts) = status.power_w() {
//!         println!("Power: {:.1} W", watts);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Protocol Details
//!
//! A request is built as follows:
//!
//! 1. The command payload is a JSON string (e.g. `{"gwId":...,"devId":...}`)
//! 2. For protocol 3.3 the JSON is encrypted with AES-128-ECB (PKCS7 padding)
//!    under the local key; commands other than `DP_QUERY` prepend a 15-byte
//!    plaintext version header (`"3.3"` plus 12 zero bytes)
//! 3. The payload is wrapped in a `0x000055AA` frame with a sequence number,
//!    command word, CRC32 checksum, and `0x0000AA55` suffix
//! 4. The frame is sent over TCP to port 6668; the response uses the same
//!    framing with a 4-byte return code ahead of the payload

pub mod commands;
pub mod crypto;
pub mod device;
pub mod error;
pub mod frame;
pub mod status;

pub use device::{DeviceConfig, OutletDevice, ProtocolVersion, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::Error;
pub use frame::CommandType;
pub use status::DeviceStatus;

/// The version of the tuya-core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
