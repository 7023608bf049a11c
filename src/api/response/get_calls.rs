use crate::api::response::temperature::Temperature;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOperation {
    #[serde(default)]
    pub remaining_runtime: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heater {
    #[serde(default)]
    pub heater_state: Option<String>,
    #[serde(default)]
    pub last_measured_temperature: Option<Temperature>,
    #[serde(default)]
    pub current_operation: Option<CurrentOperation>,
}

#[derive(Deserialize)]
pub struct Device {
    pub imei: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub heaters: Vec<Heater>,
}

#[derive(Deserialize)]
pub struct GetCalls {
    #[serde(default)]
    pub content: Vec<Device>,
}
