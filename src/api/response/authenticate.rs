use serde::Deserialize;

#[derive(Deserialize)]
pub struct Authenticate {
    pub token: String,
}
