pub mod authenticate;
pub mod get_calls;
pub mod heartbeat;
pub mod temperature;
