use config::Config;
use eberspaecher_rs::api;
use eberspaecher_rs::model::{Api, OperationMode, DEFAULT_RUNTIME};
use eberspaecher_rs::settings::SharedSettings;

mod report;

const API_URL: &str = "https://myeberspaecher.com/escw-application-server/rest/v1";

#[derive(Clone, serde::Deserialize)]
pub struct EberspaecherConfig {
    api_url: String,
    username: String,
    password: String,
    mode: String,
    runtime: u32,
    /// Optional heater command to send after the diagnostics run: "on"/"off".
    command: Option<String>,
}

pub fn read_settings() -> EberspaecherConfig {
    let mut settings = Config::default();
    settings
        .merge(config::Environment::with_prefix("EBER"))
        .unwrap()
        .set_default("api_url", API_URL)
        .unwrap()
        .set_default("mode", OperationMode::Heating.as_str())
        .unwrap()
        .set_default("runtime", DEFAULT_RUNTIME as i64)
        .unwrap();

    settings.try_into().expect("Configuration error")
}

async fn run_command(api: &Api, imei: &str, command: &str, settings: &SharedSettings) {
    let accepted = match command {
        "on" => {
            let (mode, runtime) = settings.command();
            println!("\nSwitching heater on: mode={}, runtime={} min", mode, runtime);
            api::set_heater(api, imei, mode, runtime).await
        }
        "off" => {
            println!("\nSwitching heater off");
            api::set_heater(api, imei, OperationMode::Off, DEFAULT_RUNTIME).await
        }
        other => {
            log::error!("Unknown command: {} (expected \"on\" or \"off\")", other);
            return;
        }
    };

    if accepted {
        println!("Command accepted.");
    } else {
        println!("Command rejected, see log for details.");
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let settings = read_settings();
    let mode = settings.mode.parse().unwrap_or_else(|e| {
        log::warn!("{}, falling back to HEATING", e);
        OperationMode::Heating
    });
    let heater_settings = SharedSettings::new(mode, settings.runtime);

    let api = api::api(settings.api_url, settings.username, settings.password)
        .expect("Unable to initialize API client");

    println!("--- Eberspächer diagnostics ---");

    if !api::login(&api).await {
        eprintln!("Login failed, check EBER_USERNAME/EBER_PASSWORD.");
        std::process::exit(1);
    }

    let devices = api::devices(&api).await;
    let device = match devices.first() {
        Some(device) => device,
        None => {
            println!("No devices found.");
            return;
        }
    };

    println!("{}", report::device_summary(device));

    let diagnostics = api::diagnostics(&api, &device.imei).await;
    if diagnostics.is_empty() {
        println!("  No heartbeat received.");
    } else {
        println!("{}", report::diagnostic_summary(&diagnostics));
    }

    if let Some(command) = settings.command.as_deref() {
        run_command(&api, &device.imei, command, &heater_settings).await;
    }
}
