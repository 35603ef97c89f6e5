//! Command payload builders for Tuya smart plugs.
//!
//! Commands are JSON documents carrying the device identifier and a unix
//! timestamp. Unlike the framing and encryption layers, these payloads are
//! device-specific: a smart plug exposes its relay on DP `"1"`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

/// Data point code for the relay switch on smart plugs.
pub const DP_SWITCH: &str = "1";

/// Builds a `DP_QUERY` payload requesting all data points.
///
/// Gateway id, device id, and uid are all the device id for a standalone
/// plug.
pub fn dp_query(device_id: &str) -> String {
    json!({
        "gwId": device_id,
        "devId": device_id,
        "uid": device_id,
        "t": timestamp(),
    })
    .to_string()
}

/// Builds a `CONTROL` payload setting the relay state.
pub fn set_switch(device_id: &str, on: bool) -> String {
    json!({
        "devId": device_id,
        "uid": device_id,
        "t": timestamp(),
        "dps": { DP_SWITCH: on },
    })
    .to_string()
}

/// Current unix time as a decimal string, the format the firmware expects.
fn timestamp() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs.to_string()
}
