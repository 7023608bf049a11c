use std::fmt;
use std::str::FromStr;
use tokio::sync::Mutex;

/// Default heater runtime in minutes, used when no runtime was configured.
pub const DEFAULT_RUNTIME: u32 = 30;

#[derive(Debug)]
pub struct Api {
    pub api_url: String,
    pub username: String,
    pub password: String,
    pub client: reqwest::Client,
    /// Cached bearer token. The mutex is held across the implicit login so that
    /// overlapping update cycles perform at most one authentication.
    pub token: Mutex<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    Heating,
    Ventilation,
    Off,
}

impl OperationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMode::Heating => "HEATING",
            OperationMode::Ventilation => "VENTILATION",
            OperationMode::Off => "OFF",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("HEATING") {
            Ok(OperationMode::Heating)
        } else if s.eq_ignore_ascii_case("VENTILATION") {
            Ok(OperationMode::Ventilation)
        } else if s.eq_ignore_ascii_case("OFF") {
            Ok(OperationMode::Off)
        } else {
            Err(format!("Unknown operation mode: {}", s))
        }
    }
}

/// One vehicle/tracker unit as reported by the `/calls` listing. The IMEI is
/// the primary key used by all per-device endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub imei: String,
    pub name: Option<String>,
    pub heaters: Vec<Heater>,
}

impl Device {
    /// First (and in practice only) heater unit of the vehicle.
    pub fn heater(&self) -> Option<&Heater> {
        self.heaters.get(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heater {
    pub state: Option<String>,
    /// Last measured cabin temperature in °C.
    pub temperature: Option<f64>,
    /// Remaining runtime of the current operation in minutes.
    pub remaining_runtime: u32,
}

impl Heater {
    pub fn is_running(&self) -> bool {
        match self.state.as_deref() {
            Some("OFF") | Some("DEACTIVATION_REQUESTED") | None => false,
            Some(_) => true,
        }
    }
}

/// Latest heartbeat of a device. All fields are optional; a failed fetch is
/// represented by the all-empty default value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Supply voltage in millivolts.
    pub voltage_mv: Option<u64>,
    /// Modem signal quality on the CSQ scale (0-31).
    pub rssi: Option<i64>,
    pub timestamp: Option<String>,
}

impl Diagnostics {
    /// Supply voltage in volts, rounded to two decimals. A raw value of 0 mV
    /// means the modem had no reading and is treated as absent.
    pub fn voltage_volts(&self) -> Option<f64> {
        self.voltage_mv
            .filter(|mv| *mv != 0)
            .map(|mv| (mv as f64 / 1000.0 * 100.0).round() / 100.0)
    }

    /// CSQ converted to dBm via `(csq * 2) - 113`. Values outside the CSQ
    /// range are not converted (the raw value is assumed to already be dBm).
    pub fn signal_dbm(&self) -> Option<i64> {
        self.rssi
            .filter(|csq| (0..=31).contains(csq))
            .map(|csq| csq * 2 - 113)
    }

    pub fn is_empty(&self) -> bool {
        *self == Diagnostics::default()
    }
}
