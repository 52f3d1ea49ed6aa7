use std::env;

use chrono::Duration;
use lens_track_engine::otp::OtpSettings;
use log::*;
use ltg_common::{parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_LTG_HOST: &str = "127.0.0.1";
const DEFAULT_LTG_PORT: u16 = 4880;
const DEFAULT_LTG_DATABASE_URL: &str = "sqlite://data/lens_track.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The facility id stamped onto every group order. The server refuses to start without it.
    pub admin_id: String,
    /// The shared key that every client must present in the `ltg-api-key` header.
    pub api_key: Secret<String>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// OTP checkpoint policy: code lifetime and whether the "0000" override is honored.
    pub otp: OtpSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LTG_HOST.to_string(),
            port: DEFAULT_LTG_PORT,
            database_url: String::default(),
            admin_id: String::default(),
            api_key: Secret::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            otp: OtpSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LTG_HOST").ok().unwrap_or_else(|| DEFAULT_LTG_HOST.into());
        let port = env::var("LTG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for LTG_PORT. {e} Using the default, {DEFAULT_LTG_PORT}, instead."
                    );
                    DEFAULT_LTG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_LTG_PORT);
        let database_url = env::var("LTG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LTG_DATABASE_URL is not set. Using the default, {DEFAULT_LTG_DATABASE_URL}, instead.");
            DEFAULT_LTG_DATABASE_URL.into()
        });
        let admin_id = env::var("LTG_ADMIN_ID").ok().unwrap_or_else(|| {
            error!(
                "🪛️ LTG_ADMIN_ID is not set. Group orders cannot be routed to a facility without it, and the server \
                 will refuse to start."
            );
            String::default()
        });
        let api_key = configure_api_key();
        let otp = configure_otp_settings();
        let use_x_forwarded_for =
            parse_boolean_flag(env::var("LTG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("LTG_USE_FORWARDED").ok(), false);
        Self { host, port, database_url, admin_id, api_key, use_x_forwarded_for, use_forwarded, otp }
    }
}

fn configure_api_key() -> Secret<String> {
    match env::var("LTG_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Secret::new(key),
        _ => {
            let key = random_api_key();
            warn!(
                "🚨️🚨️🚨️ The API key has not been set. I'm using the random value {key} for this session. No client \
                 knows this key, so every request will be rejected until you set the LTG_API_KEY environment variable \
                 and restart. 🚨️🚨️🚨️"
            );
            Secret::new(key)
        },
    }
}

pub fn random_api_key() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

fn configure_otp_settings() -> OtpSettings {
    let defaults = OtpSettings::default();
    let ttl = env::var("LTG_OTP_TTL_SECONDS")
        .map_err(|_| {
            info!(
                "🪛️ LTG_OTP_TTL_SECONDS is not set. Using the default value of {} seconds.",
                defaults.ttl.num_seconds()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::seconds)
                .map_err(|e| warn!("🪛️ Invalid configuration value for LTG_OTP_TTL_SECONDS. {e}"))
        })
        .ok()
        .unwrap_or(defaults.ttl);
    let allow_bypass = parse_boolean_flag(env::var("LTG_ALLOW_OTP_BYPASS").ok(), false);
    if allow_bypass {
        warn!(
            "🚨️ The '0000' OTP override is enabled. Every checkpoint on this server will accept it in place of a \
             real code. Do not run a production instance like this."
        );
    }
    OtpSettings { ttl, allow_bypass }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Generally we try to keep this as small as possible,
/// and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub admin_id: String,
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            admin_id: config.admin_id.clone(),
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
        }
    }
}
