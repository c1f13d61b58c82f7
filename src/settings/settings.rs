use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auth: Auth,
    pub contact: Contact,
    pub http: Http,
    pub log: Log,
    pub moderation: Moderation,
    pub realtime: Realtime,
    pub storage: Storage,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub backend: String, // "fake" or "jwt"
    pub issuer: String,
    pub audience: String,
    /// Name of the environment variable holding the HS256 key.
    pub signing_key_env: String,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            backend: "fake".to_owned(),
            issuer: "tradepost.auth".to_owned(),
            audience: "tradepost-app".to_owned(),
            signing_key_env: "JWT_SIGNING_KEY".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub request_ttl_hours: u32,
    pub cooldown_hours: u32,
    /// 0 disables the background sweep.
    pub sweep_interval_secs: u64,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            request_ttl_hours: 7 * 24,
            cooldown_hours: 24,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Http {
    pub address: String,
    pub tls: Option<Tls>,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_owned(),
            tls: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Log {
    pub filter: String,
    pub ansi: bool,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            ansi: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Moderation {
    pub blocked_words: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Realtime {
    pub backend: String, // "local" or "kafka"
    pub kafka_bootstrap: String,
}

impl Default for Realtime {
    fn default() -> Self {
        Self {
            backend: "local".to_owned(),
            kafka_bootstrap: "localhost:9092".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: String,
    pub seed_path: Option<String>,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: "memory".to_owned(),
            mysql_dsn: String::new(),
            seed_path: None,
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
[storage]
backend = "mysql"
mysql_dsn = "mysql://app@localhost/tradepost"

[contact]
cooldown_hours = 12
"#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.storage.backend, "mysql");
        assert_eq!(settings.contact.cooldown_hours, 12);
        assert_eq!(settings.contact.request_ttl_hours, 168);
        assert_eq!(settings.auth.backend, "fake");
        assert!(settings.http.tls.is_none());
    }
}
