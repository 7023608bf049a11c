use serde_json::Value;

/// Measured temperature in °C. The vendor reports either a bare number or a
/// mapping with a `temperature` field, depending on firmware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(pub f64);

impl<'de> serde::Deserialize<'de> for Temperature {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(d)?;

        match &value {
            Value::Number(_) => value.as_f64(),
            Value::Object(map) => map.get("temperature").and_then(Value::as_f64),
            _ => None,
        }
        .ok_or_else(|| serde::de::Error::missing_field("temperature"))
        .map(Temperature)
    }
}
