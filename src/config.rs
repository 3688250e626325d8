use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub jwt_secret: String,
    pub qr_signing_secret: String,
    pub pad_rps: u32,
    pub public_rps: u32,
    pub log_format: LogFormat,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Timing and probability knobs of the pad/phone interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub scan_success_probability: f64,
    pub scan_verify_delay: Duration,
    pub authorize_settle_delay: Duration,
    pub challenge_validity_secs: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            scan_success_probability: 0.8,
            scan_verify_delay: Duration::from_millis(1500),
            authorize_settle_delay: Duration::from_millis(1500),
            challenge_validity_secs: 60,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = SessionSettings::default();
        let probability: f64 =
            get_env_or("SCAN_SUCCESS_PROBABILITY", defaults.scan_success_probability)?;
        if !probability.is_finite() {
            return Err(Error::Config(
                "Invalid value for SCAN_SUCCESS_PROBABILITY: not a finite number".to_string(),
            ));
        }
        let validity: u32 =
            get_env_or("CHALLENGE_VALIDITY_SECS", defaults.challenge_validity_secs)?;
        if validity == 0 {
            return Err(Error::Config(
                "Invalid value for CHALLENGE_VALIDITY_SECS: must be positive".to_string(),
            ));
        }

        let log_format = match env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") => LogFormat::Json,
            Some("text") | None => LogFormat::Text,
            Some(other) => {
                return Err(Error::Config(format!(
                    "Invalid value for LOG_FORMAT: {}",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            jwt_secret: get_env("JWT_SECRET")?,
            qr_signing_secret: get_env("QR_SIGNING_SECRET")?,
            pad_rps: get_env_or("PAD_RPS", 50)?,
            public_rps: get_env_or("PUBLIC_RPS", 50)?,
            log_format,
            session: SessionSettings {
                scan_success_probability: probability.clamp(0.0, 1.0),
                scan_verify_delay: Duration::from_millis(get_env_or(
                    "SCAN_VERIFY_DELAY_MS",
                    defaults.scan_verify_delay.as_millis() as u64,
                )?),
                authorize_settle_delay: Duration::from_millis(get_env_or(
                    "AUTHORIZE_SETTLE_DELAY_MS",
                    defaults.authorize_settle_delay.as_millis() as u64,
                )?),
                challenge_validity_secs: validity,
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<&'static Config> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    get_config()
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
