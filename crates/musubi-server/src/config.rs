//! Server configuration loaded from `MUSUBI_*` environment variables.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use musubi_db::DbConfig;
use musubi_service::{RerecordPolicy, ServiceConfig};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Bearer token verification settings.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// PEM-encoded Ed25519 public key of the identity provider.
    pub public_key_pem: String,
    /// Expected `iss` claim.
    pub issuer: String,
}

/// FCM HTTP v1 settings.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// API base URL (default: `https://fcm.googleapis.com`).
    pub endpoint: String,
    pub project_id: String,
    /// OAuth2 access token sent as the bearer credential.
    pub access_token: String,
}

impl FcmConfig {
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db: DbConfig,
    pub token: TokenConfig,
    pub fcm: FcmConfig,
    pub service: ServiceConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let service_defaults = ServiceConfig::default();

        Ok(Self {
            bind_addr: try_load("MUSUBI_BIND_ADDR", "0.0.0.0:3000")?,
            db: DbConfig {
                url: try_load("MUSUBI_DB_URL", &db_defaults.url)?,
                namespace: try_load("MUSUBI_DB_NAMESPACE", &db_defaults.namespace)?,
                database: try_load("MUSUBI_DB_DATABASE", &db_defaults.database)?,
                username: try_load("MUSUBI_DB_USERNAME", &db_defaults.username)?,
                password: try_load("MUSUBI_DB_PASSWORD", &db_defaults.password)?,
            },
            token: TokenConfig {
                public_key_pem: required("MUSUBI_JWT_PUBLIC_KEY")?,
                issuer: try_load("MUSUBI_JWT_ISSUER", "musubi")?,
            },
            fcm: FcmConfig {
                endpoint: try_load("MUSUBI_FCM_ENDPOINT", "https://fcm.googleapis.com")?,
                project_id: required("MUSUBI_FCM_PROJECT_ID")?,
                access_token: required("MUSUBI_FCM_ACCESS_TOKEN")?,
            },
            service: ServiceConfig {
                rerecord_policy: parse_policy(&try_load::<String>(
                    "MUSUBI_RERECORD_POLICY",
                    "reset",
                )?)?,
                analytics_event_window: try_load(
                    "MUSUBI_ANALYTICS_EVENT_WINDOW",
                    &service_defaults.analytics_event_window.to_string(),
                )?,
                ..service_defaults
            },
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn parse_policy(raw: &str) -> Result<RerecordPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "reset" | "reset_payments" => Ok(RerecordPolicy::ResetPayments),
        "preserve" | "preserve_settled" => Ok(RerecordPolicy::PreserveSettled),
        other => Err(ConfigError::Invalid {
            key: "MUSUBI_RERECORD_POLICY",
            message: format!("expected `reset` or `preserve`, got `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names() {
        assert_eq!(parse_policy("reset").unwrap(), RerecordPolicy::ResetPayments);
        assert_eq!(
            parse_policy("Preserve_Settled").unwrap(),
            RerecordPolicy::PreserveSettled
        );
        assert!(matches!(
            parse_policy("merge"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn fcm_url_has_project() {
        let fcm = FcmConfig {
            endpoint: "https://fcm.googleapis.com/".into(),
            project_id: "circles-prod".into(),
            access_token: String::new(),
        };
        assert_eq!(
            fcm.send_url(),
            "https://fcm.googleapis.com/v1/projects/circles-prod/messages:send"
        );
    }

    #[test]
    fn defaults_parse() {
        let addr: SocketAddr = try_load("MUSUBI_TEST_UNSET_ADDR", "127.0.0.1:3000").unwrap();
        assert_eq!(addr.port(), 3000);
        let bad = try_load::<u64>("MUSUBI_TEST_UNSET_WINDOW", "twenty");
        assert!(matches!(bad, Err(ConfigError::Invalid { .. })));
    }
}
