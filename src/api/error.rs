use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    /// Non-200 on `/authenticate`, or a transport error during login.
    LoginError(String),
    /// Non-success status on any other endpoint, or a transport error.
    ApiError(String),
    /// Response body could not be parsed; carries the parse error and the body.
    InvalidResponse(String, String),
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LoginError(s) => write!(f, "login failed: {}", s),
            Error::ApiError(s) => write!(f, "API request failed: {}", s),
            Error::InvalidResponse(e, body) => {
                write!(f, "invalid API response ({}): {}", e, body)
            }
            Error::InternalError => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for Error {}
