use serde::Deserialize;

#[derive(Deserialize)]
pub struct Heartbeat {
    #[serde(default)]
    pub voltage: Option<u64>,
    #[serde(default)]
    pub rssi: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
