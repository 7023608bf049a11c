pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use reqwest::StatusCode;
use response::authenticate::Authenticate;
use response::get_calls::GetCalls;
use response::heartbeat::Heartbeat;
use serde_json::json;
use tokio::sync::Mutex;

const AUTH_EMAIL_HEADER: &str = "escw-auth-email";
const AUTH_PASSWORD_HEADER: &str = "escw-auth-password";
const AUTH_TOKEN_HEADER: &str = "escw-auth-token";

/* Fixed pagination of the device listing; the vendor portal never requests
 * more than one page either. */
const CALLS_QUERY: &[(&str, &str)] = &[
    ("fetchHeater", "FULL"),
    ("email", "CURRENT"),
    ("page", "0"),
    ("size", "5"),
];

pub fn api(api_url: String, username: String, password: String) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .build()
        .or(Err(Error::InternalError))?;

    Ok(model::Api {
        api_url,
        username,
        password,
        client,
        token: Mutex::new(None),
    })
}

async fn authenticate(api: &model::Api) -> Result<String, Error> {
    let url = format!("{}{}", api.api_url, endpoint::AUTHENTICATE);

    let response = api
        .client
        .post(url)
        .header(AUTH_EMAIL_HEADER, &api.username)
        .header(AUTH_PASSWORD_HEADER, &api.password)
        .send()
        .await
        .map_err(|e| Error::LoginError(e.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(Error::LoginError(format!(
            "server responded {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::LoginError(e.to_string()))?;

    serde_json::from_str::<Authenticate>(&body)
        .map_err(|e| Error::InvalidResponse(e.to_string(), body))
        .map(|response| response.token)
}

/// Authenticate and cache the token. On failure the previously cached token
/// (if any) is left untouched.
pub async fn login(api: &model::Api) -> bool {
    match authenticate(api).await {
        Ok(token) => {
            *api.token.lock().await = Some(token);
            true
        }
        Err(e) => {
            log::error!("Login failed: {}", e);
            false
        }
    }
}

/// Return the cached token, logging in first when none is cached yet. The
/// token mutex is held across the login, so concurrent callers trigger at
/// most one authentication.
async fn ensure_token(api: &model::Api) -> Result<String, Error> {
    let mut token = api.token.lock().await;

    match token.as_ref() {
        Some(token) => Ok(token.clone()),
        None => {
            let fresh = authenticate(api).await?;
            *token = Some(fresh.clone());
            Ok(fresh)
        }
    }
}

async fn get(
    api: &model::Api,
    path: &str,
    token: &str,
    query: Option<&[(&str, &str)]>,
) -> Result<String, Error> {
    let url = format!("{}{}", api.api_url, path);

    let request = match query {
        Some(query) => api.client.get(&url).query(query),
        None => api.client.get(&url),
    }
    .header(AUTH_TOKEN_HEADER, token);

    let response = request
        .send()
        .await
        .map_err(|e| Error::ApiError(e.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(Error::ApiError(format!(
            "{} responded {}",
            path,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| Error::ApiError(format!("Error reading API response: {}", e)))
}

async fn fetch_devices(api: &model::Api) -> Result<Vec<model::Device>, Error> {
    let token = ensure_token(api).await?;
    let body = get(api, endpoint::CALLS, &token, Some(CALLS_QUERY)).await?;

    serde_json::from_str::<GetCalls>(&body)
        .map_err(|e| Error::InvalidResponse(e.to_string(), body))
        .map(|response| {
            response
                .content
                .into_iter()
                .map(|device| model::Device {
                    imei: device.imei,
                    name: device.name,
                    heaters: device
                        .heaters
                        .into_iter()
                        .map(|heater| model::Heater {
                            state: heater.heater_state,
                            temperature: heater.last_measured_temperature.map(|t| t.0),
                            remaining_runtime: heater
                                .current_operation
                                .map(|op| op.remaining_runtime)
                                .unwrap_or(0),
                        })
                        .collect(),
                })
                .collect()
        })
}

/// List all devices of the account. Failures (including a failed implicit
/// login) are logged and collapse to an empty list; callers treat the result
/// as best-effort.
pub async fn devices(api: &model::Api) -> Vec<model::Device> {
    match fetch_devices(api).await {
        Ok(devices) => devices,
        Err(e) => {
            log::error!("Device list unavailable: {}", e);
            Vec::new()
        }
    }
}

async fn fetch_diagnostics(api: &model::Api, imei: &str) -> Result<model::Diagnostics, Error> {
    let token = ensure_token(api).await?;
    let body = get(api, &endpoint::heartbeat_latest(imei), &token, None).await?;

    serde_json::from_str::<Heartbeat>(&body)
        .map_err(|e| Error::InvalidResponse(e.to_string(), body))
        .map(|heartbeat| model::Diagnostics {
            voltage_mv: heartbeat.voltage,
            rssi: heartbeat.rssi,
            timestamp: heartbeat.timestamp,
        })
}

/// Fetch the latest heartbeat (voltage, signal, timestamp) of `imei`.
/// Failures are logged and collapse to the empty `Diagnostics`.
pub async fn diagnostics(api: &model::Api, imei: &str) -> model::Diagnostics {
    match fetch_diagnostics(api, imei).await {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            log::error!("Heartbeat for {} unavailable: {}", imei, e);
            model::Diagnostics::default()
        }
    }
}

async fn send_heater_command(
    api: &model::Api,
    imei: &str,
    mode: model::OperationMode,
    runtime: u32,
) -> Result<(), Error> {
    let token = ensure_token(api).await?;
    let url = format!("{}{}", api.api_url, endpoint::heater(imei));

    /* Switching off clears the auxiliary flags as well; any other mode starts
     * a fresh operation, so remainingRuntime is reset to 0. */
    let payload = match mode {
        model::OperationMode::Off => json!({
            "operationMode": "OFF",
            "temperatureLowering": "OFF",
            "altitudeFunction": "OFF",
        }),
        mode => json!({
            "operationMode": mode.as_str(),
            "runtime": runtime,
            "remainingRuntime": 0,
            "temperatureLowering": null,
            "altitudeFunction": null,
        }),
    };

    let response = api
        .client
        .put(url)
        .header(AUTH_TOKEN_HEADER, &token)
        .json(&payload)
        .send()
        .await
        .map_err(|e| Error::ApiError(e.to_string()))?;

    match response.status() {
        StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::ApiError(format!(
                "heater command rejected ({}): {}",
                status, body
            )))
        }
    }
}

/// Switch the heater of `imei` to `mode` for `runtime` minutes (`runtime` is
/// ignored for `Off`). Returns whether the vendor accepted the command.
pub async fn set_heater(
    api: &model::Api,
    imei: &str,
    mode: model::OperationMode,
    runtime: u32,
) -> bool {
    match send_heater_command(api, imei, mode, runtime).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Switching heater {} failed: {}", imei, e);
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::OperationMode;
    use mockito::{Matcher, Server, ServerGuard};

    const IMEI: &str = "351234567890123";

    fn test_api(server: &ServerGuard) -> model::Api {
        api(
            server.url(),
            String::from("user@example.com"),
            String::from("hunter2"),
        )
        .unwrap()
    }

    async fn seed_token(api: &model::Api, token: &str) {
        *api.token.lock().await = Some(String::from(token));
    }

    fn calls_query_matcher() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("fetchHeater".into(), "FULL".into()),
            Matcher::UrlEncoded("email".into(), "CURRENT".into()),
            Matcher::UrlEncoded("page".into(), "0".into()),
            Matcher::UrlEncoded("size".into(), "5".into()),
        ])
    }

    #[tokio::test]
    async fn login_stores_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/authenticate")
            .match_header(AUTH_EMAIL_HEADER, "user@example.com")
            .match_header(AUTH_PASSWORD_HEADER, "hunter2")
            .with_status(200)
            .with_body(r#"{"token": "tok-1"}"#)
            .create_async()
            .await;

        let api = test_api(&server);
        assert!(login(&api).await);
        assert_eq!(Some("tok-1"), api.token.lock().await.as_deref());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/authenticate")
            .with_status(401)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "stale").await;

        assert!(!login(&api).await);
        assert_eq!(Some("stale"), api.token.lock().await.as_deref());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn devices_logs_in_once_and_attaches_token() {
        let mut server = Server::new_async().await;
        let auth = server
            .mock("POST", "/authenticate")
            .with_status(200)
            .with_body(r#"{"token": "tok-2"}"#)
            .expect(1)
            .create_async()
            .await;
        let calls = server
            .mock("GET", "/calls")
            .match_query(calls_query_matcher())
            .match_header(AUTH_TOKEN_HEADER, "tok-2")
            .with_status(200)
            .with_body(
                r#"{"content": [{"imei": "351234567890123", "name": "Camper",
                    "heaters": [{"heaterState": "OFF"}]}]}"#,
            )
            .create_async()
            .await;

        let api = test_api(&server);
        let devices = devices(&api).await;

        assert_eq!(1, devices.len());
        assert_eq!(IMEI, devices[0].imei);
        assert_eq!(Some("Camper"), devices[0].name.as_deref());
        auth.assert_async().await;
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn devices_skips_request_when_login_fails() {
        let mut server = Server::new_async().await;
        let auth = server
            .mock("POST", "/authenticate")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let calls = server
            .mock("GET", "/calls")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let api = test_api(&server);
        assert!(devices(&api).await.is_empty());
        auth.assert_async().await;
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn devices_collapses_request_failure_to_empty() {
        let mut server = Server::new_async().await;
        let calls = server
            .mock("GET", "/calls")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        assert!(devices(&api).await.is_empty());
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn concurrent_device_listings_share_one_login() {
        let mut server = Server::new_async().await;
        let auth = server
            .mock("POST", "/authenticate")
            .with_status(200)
            .with_body(r#"{"token": "tok-3"}"#)
            .expect(1)
            .create_async()
            .await;
        let calls = server
            .mock("GET", "/calls")
            .match_query(Matcher::Any)
            .match_header(AUTH_TOKEN_HEADER, "tok-3")
            .with_status(200)
            .with_body(r#"{"content": []}"#)
            .expect(2)
            .create_async()
            .await;

        let api = test_api(&server);
        let (first, second) = tokio::join!(devices(&api), devices(&api));

        assert!(first.is_empty());
        assert!(second.is_empty());
        auth.assert_async().await;
        calls.assert_async().await;
    }

    #[tokio::test]
    async fn diagnostics_parses_heartbeat() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/heartbeat/351234567890123/latest")
            .match_header(AUTH_TOKEN_HEADER, "tok")
            .with_status(200)
            .with_body(r#"{"voltage": 12559, "rssi": 12, "timestamp": "T"}"#)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        let diag = diagnostics(&api, IMEI).await;
        assert_eq!(Some(12559), diag.voltage_mv);
        assert_eq!(Some(12), diag.rssi);
        assert_eq!(Some("T"), diag.timestamp.as_deref());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn diagnostics_collapses_failure_to_empty() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/heartbeat/351234567890123/latest")
            .with_status(404)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        assert!(diagnostics(&api, IMEI).await.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn switching_off_clears_flags_and_sends_no_runtime() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/calls/351234567890123/heaters/1")
            .match_header(AUTH_TOKEN_HEADER, "tok")
            .match_body(Matcher::Json(serde_json::json!({
                "operationMode": "OFF",
                "temperatureLowering": "OFF",
                "altitudeFunction": "OFF",
            })))
            .with_status(200)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        assert!(set_heater(&api, IMEI, OperationMode::Off, 30).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn switching_on_sends_mode_and_runtime() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/calls/351234567890123/heaters/1")
            .match_header(AUTH_TOKEN_HEADER, "tok")
            .match_body(Matcher::Json(serde_json::json!({
                "operationMode": "HEATING",
                "runtime": 45,
                "remainingRuntime": 0,
                "temperatureLowering": null,
                "altitudeFunction": null,
            })))
            .with_status(204)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        assert!(set_heater(&api, IMEI, OperationMode::Heating, 45).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_heater_command_returns_false() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/calls/351234567890123/heaters/1")
            .with_status(422)
            .with_body(r#"{"message": "heater busy"}"#)
            .create_async()
            .await;

        let api = test_api(&server);
        seed_token(&api, "tok").await;

        assert!(!set_heater(&api, IMEI, OperationMode::Ventilation, 30).await);
        mock.assert_async().await;
    }
}
