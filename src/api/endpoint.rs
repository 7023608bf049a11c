pub type Endpoint = str;

pub const AUTHENTICATE: &Endpoint = "/authenticate";
pub const CALLS: &Endpoint = "/calls";

pub fn heartbeat_latest(imei: &str) -> String {
    format!("/heartbeat/{}/latest", imei)
}

pub fn heater(imei: &str) -> String {
    format!("/calls/{}/heaters/1", imei)
}
