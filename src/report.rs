use eberspaecher_rs::model::{Device, Diagnostics};

/// Human readable summary of a vehicle as listed by `/calls`.
pub fn device_summary(device: &Device) -> String {
    let name = device.name.as_deref().unwrap_or("Eberspächer");
    let state = device
        .heater()
        .and_then(|heater| heater.state.as_deref())
        .unwrap_or("UNKNOWN");
    let temperature = device
        .heater()
        .and_then(|heater| heater.temperature)
        .map(|celsius| format!("{} °C", celsius))
        .unwrap_or_else(|| String::from("N/A"));

    let mut summary = format!(
        "Vehicle: {} (IMEI: {})\n  State:       {}\n  Temperature: {}",
        name, device.imei, state, temperature
    );

    if let Some(heater) = device.heater() {
        if heater.is_running() {
            summary.push_str(&format!(
                "\n  Remaining:   {} min",
                heater.remaining_runtime
            ));
        }
    }

    summary
}

/// Human readable summary of the latest heartbeat.
pub fn diagnostic_summary(diag: &Diagnostics) -> String {
    let battery = diag
        .voltage_volts()
        .map(|volts| format!("{:.2} V", volts))
        .unwrap_or_else(|| String::from("N/A"));

    let signal = match (diag.rssi, diag.signal_dbm()) {
        (Some(csq), Some(dbm)) => format!("{} ({} dBm)", csq, dbm),
        /* Out of CSQ range, assume the device already reports dBm. */
        (Some(raw), None) => raw.to_string(),
        (None, _) => String::from("N/A"),
    };

    format!(
        "  Battery:   {}\n  Signal:    {}\n  Timestamp: {}",
        battery,
        signal,
        diag.timestamp.as_deref().unwrap_or("N/A")
    )
}
