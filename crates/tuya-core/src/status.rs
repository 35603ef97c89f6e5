//! Typed access to decoded device status.
//!
//! A status response is a JSON document with a `dps` map from data point
//! codes to raw values. Metering values are reported as scaled integers
//! fixed by vendor convention; the accessors here apply the scaling:
//!
//! | DP    | Field         | Raw unit    | Accessor unit |
//! |-------|---------------|-------------|---------------|
//! | `1`   | relay switch  | bool        | bool          |
//! | `18`  | current       | mA          | mA            |
//! | `19`  | power         | W × 10      | W             |
//! | `20`  | voltage       | V × 10      | V             |
//! | `101` | total energy  | kWh × 100   | kWh           |
//!
//! An absent data point simply means the device did not report that field;
//! every accessor returns `Option`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Decoded status snapshot from a `DP_QUERY`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceStatus {
    /// Device id echoed by the firmware, when present.
    #[serde(default, rename = "devId")]
    pub device_id: String,

    /// Raw data point map.
    #[serde(default)]
    pub dps: BTreeMap<String, Value>,
}

impl DeviceStatus {
    /// Parses a decrypted status payload.
    ///
    /// An empty payload (a command ack) yields an empty status.
    pub fn from_payload(payload: &[u8]) -> Result<Self, Error> {
        if payload.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(payload).map_err(|e| Error::ParseError(e.to_string()))
    }

    /// Returns the raw value for a data point code, if reported.
    pub fn dp(&self, code: &str) -> Option<&Value> {
        self.dps.get(code)
    }

    /// Relay state from DP 1.
    pub fn switch_on(&self) -> Option<bool> {
        self.dp("1").and_then(Value::as_bool)
    }

    /// Current in milliamps from DP 18.
    pub fn current_ma(&self) -> Option<f64> {
        self.dp("18").and_then(Value::as_f64)
    }

    /// Power in watts from DP 19 (reported as W × 10).
    pub fn power_w(&self) -> Option<f64> {
        self.dp("19").and_then(Value::as_f64).map(|raw| raw / 10.0)
    }

    /// Voltage in volts from DP 20 (reported as V × 10).
    pub fn voltage_v(&self) -> Option<f64> {
        self.dp("20").and_then(Value::as_f64).map(|raw| raw / 10.0)
    }

    /// Cumulative energy in kWh from DP 101 (reported as kWh × 100).
    pub fn energy_kwh(&self) -> Option<f64> {
        self.dp("101").and_then(Value::as_f64).map(|raw| raw / 100.0)
    }

    /// Returns true if no data points were reported.
    pub fn is_empty(&self) -> bool {
        self.dps.is_empty()
    }
}
