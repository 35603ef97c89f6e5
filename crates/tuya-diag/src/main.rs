//! Connectivity and control diagnostic for a Tuya smart plug.
//!
//! Edit the constants in the configuration section below with the device
//! id, IP address, and local key obtained from pairing, then run the
//! binary. It verifies that the device answers a status query on the
//! local network, prints the decoded data points, and optionally toggles
//! the relay to confirm control works end to end.

use std::io::{self, BufRead, Write as _};
use std::process::ExitCode;
use std::time::Duration;

use tracing::debug;
use tuya_core::{DeviceConfig, DeviceStatus, OutletDevice, ProtocolVersion};

// ------------------------------------------------------------------
// Edit this section with your device info.
// ------------------------------------------------------------------

/// Device id from pairing.
const DEVICE_ID: &str = "YOUR_DEVICE_ID_HERE";

/// Device IP address. Give the device a static lease so this stays valid.
const DEVICE_ADDR: &str = "192.168.1.XXX";

/// Local key from pairing (16 characters).
const LOCAL_KEY: &str = "YOUR_LOCAL_KEY_HERE";

/// Protocol version, usually 3.3 on current firmware.
const VERSION: ProtocolVersion = ProtocolVersion::V33;

/// Electricity rate used for the cost estimate, in $/kWh.
const ELECTRICITY_RATE: f64 = 0.20;

// ------------------------------------------------------------------

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

fn make_device() -> Result<OutletDevice, tuya_core::Error> {
    let config = DeviceConfig::new(DEVICE_ID, DEVICE_ADDR, LOCAL_KEY)
        .with_version(VERSION)
        .with_timeout(Duration::from_secs(5));
    OutletDevice::new(config)
}

fn print_data_points(status: &DeviceStatus) {
    println!("Parsed Data Points:");
    println!("{}", "-".repeat(60));

    if let Some(on) = status.switch_on() {
        println!("  Switch State: {}", if on { "ON" } else { "OFF" });
    }
    if let Some(ma) = status.current_ma() {
        println!("  Current: {ma} mA ({:.2} A)", ma / 1000.0);
    }
    if let Some(w) = status.power_w() {
        println!("  Power: {w:.1} W");
    }
    if let Some(v) = status.voltage_v() {
        println!("  Voltage: {v:.1} V");
    }
    if let Some(kwh) = status.energy_kwh() {
        println!("  Total Energy: {kwh:.2} kWh");
    }

    println!("{}", "-".repeat(60));
    println!();

    if let (Some(w), Some(kwh)) = (status.power_w(), status.energy_kwh()) {
        println!("Energy Stats:");
        println!("  Instantaneous Power: {w:.1} W");
        println!("  Total Energy Consumed: {kwh:.2} kWh");
        println!("  Estimated Total Cost: ${:.2}", kwh * ELECTRICITY_RATE);
        println!();
    }
}

/// Queries the device and prints what it reports. Returns true when the
/// device answered.
async fn test_connection() -> bool {
    banner("TUYA LOCAL CONTROL TEST");
    println!();
    println!("Testing connection to device at {DEVICE_ADDR}...");
    println!();

    let mut device = match make_device() {
        Ok(device) => device,
        Err(e) => {
            println!("ERROR: {e}");
            return false;
        }
    };

    println!("Fetching device status...");
    match device.status().await {
        Ok(status) if !status.is_empty() => {
            println!("Device responded!");
            println!();

            println!("Raw Device Data:");
            match serde_json::to_string_pretty(&status) {
                Ok(raw) => println!("{raw}"),
                Err(e) => debug!(error = %e, "could not render raw status"),
            }
            println!();

            print_data_points(&status);

            println!("LOCAL CONTROL WORKING!");
            println!();
            println!("You can now integrate this device into your app.");
            true
        }
        Ok(_) => {
            println!("No response from device");
            println!();
            println!("TROUBLESHOOTING:");
            println!("1. Check device IP address is correct");
            println!("2. Ensure device is powered on");
            println!("3. Verify local key is correct");
            println!("4. Check firewall isn't blocking port 6668");
            false
        }
        Err(e) => {
            println!("ERROR: {e}");
            println!();
            println!("TROUBLESHOOTING:");
            println!("1. Verify device info is correct");
            println!("2. Check network connectivity");
            println!("3. Ensure local key hasn't changed");
            println!("4. Rescan your network for the device's current address");
            false
        }
    }
}

/// Toggles the relay and reads the state back to confirm the change took.
async fn test_control() {
    println!();
    banner("TESTING DEVICE CONTROL");
    println!();

    let mut device = match make_device() {
        Ok(device) => device,
        Err(e) => {
            println!("Control error: {e}");
            return;
        }
    };

    println!("Attempting to toggle device...");

    let current = match device.status().await {
        Ok(status) if !status.is_empty() => status.switch_on().unwrap_or(false),
        Ok(_) | Err(_) => {
            println!("Cannot get device state");
            return;
        }
    };
    println!("Current state: {}", if current { "ON" } else { "OFF" });

    let target = !current;
    println!("Turning {}...", if target { "ON" } else { "OFF" });

    if let Err(e) = device.set_switch(target).await {
        println!("Control error: {e}");
        return;
    }

    // Give the relay a moment before reading back.
    tokio::time::sleep(Duration::from_secs(2)).await;

    match device.status().await {
        Ok(status) => {
            if status.switch_on().unwrap_or(false) == target {
                println!(
                    "Successfully turned {}!",
                    if target { "ON" } else { "OFF" }
                );
            } else {
                println!("Warning: state may not have changed");
            }
        }
        Err(e) => println!("Control error: {e}"),
    }
}

fn prompt_yes_no(question: &str) -> bool {
    print!("{question} [y/N]: ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    if DEVICE_ID == "YOUR_DEVICE_ID_HERE" {
        println!("ERROR: Please edit this program and add your device info!");
        println!();
        println!("You need to set:");
        println!("  - DEVICE_ID (device id from pairing)");
        println!("  - DEVICE_ADDR (device IP address)");
        println!("  - LOCAL_KEY (local key from pairing)");
        println!("  - VERSION (usually 3.3)");
        println!();
        return ExitCode::FAILURE;
    }

    if test_connection().await {
        println!();
        if prompt_yes_no("Test device control (turn on/off)?") {
            test_control().await;
        }
    }

    println!();
    banner("Test complete!");
    println!();
    ExitCode::SUCCESS
}
