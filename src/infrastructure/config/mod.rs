//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub channels: ChannelsConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// Station used by the bare /trein command.
    pub default_station: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChannelsConfig {
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub token: Option<String>,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServicesConfig {
    pub ns: NsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NsConfig {
    #[serde(default = "default_ns_base_url")]
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_poll_timeout() -> i64 {
    30
}

fn default_ns_base_url() -> String {
    "https://webservices.ns.nl".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "treinbot".to_string(),
                default_station: "ut".to_string(),
            },
            channels: ChannelsConfig {
                telegram: Some(TelegramConfig {
                    token: None,
                    poll_timeout_secs: default_poll_timeout(),
                }),
            },
            services: ServicesConfig {
                ns: NsConfig {
                    base_url: default_ns_base_url(),
                    username: None,
                    password: None,
                },
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BotError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| BotError::Config(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| BotError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Defaults overlaid with environment variables, for running without a
    /// config file.
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if let Some(ref mut tg) = config.channels.telegram {
                tg.token = Some(token);
            }
        }

        if let Ok(username) = std::env::var("NS_USERNAME") {
            config.services.ns.username = Some(username);
        }

        if let Ok(password) = std::env::var("NS_PASSWORD") {
            config.services.ns.password = Some(password);
        }

        config
    }

    pub fn telegram_token(&self) -> Option<String> {
        self.channels
            .telegram
            .as_ref()
            .and_then(|tg| tg.token.clone())
    }

    pub fn poll_timeout_secs(&self) -> i64 {
        self.channels
            .telegram
            .as_ref()
            .map(|tg| tg.poll_timeout_secs)
            .unwrap_or_else(default_poll_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let yaml = r#"
bot:
  name: treinbot
  default-station: ut
channels:
  telegram:
    token: "123:abc"
    poll-timeout-secs: 10
services:
  ns:
    base-url: https://webservices.ns.nl
    username: treinbot@example.org
    password: geheim
"#;

        let config: Config = serde_yaml::from_str(yaml).expect("config should parse");
        assert_eq!(config.bot.name, "treinbot");
        assert_eq!(config.bot.default_station, "ut");
        assert_eq!(config.telegram_token().as_deref(), Some("123:abc"));
        assert_eq!(config.poll_timeout_secs(), 10);
        assert_eq!(
            config.services.ns.username.as_deref(),
            Some("treinbot@example.org")
        );
    }

    #[test]
    fn omitted_optionals_fall_back_to_defaults() {
        let yaml = r#"
bot:
  name: treinbot
  default-station: asd
channels:
  telegram:
    token: null
services:
  ns: {}
"#;

        let config: Config = serde_yaml::from_str(yaml).expect("config should parse");
        assert!(config.telegram_token().is_none());
        assert_eq!(config.poll_timeout_secs(), 30);
        assert_eq!(config.services.ns.base_url, "https://webservices.ns.nl");
        assert!(config.services.ns.username.is_none());
    }

    #[test]
    fn missing_sections_are_rejected() {
        let yaml = "bot:\n  name: treinbot\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn default_config_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.bot.default_station, "ut");
        assert_eq!(config.poll_timeout_secs(), 30);
    }

    #[test]
    fn env_overlay_picks_up_token() {
        std::env::set_var("BOT_TOKEN", "456:def");
        let config = Config::load_env();
        std::env::remove_var("BOT_TOKEN");
        assert_eq!(config.telegram_token().as_deref(), Some("456:def"));
    }
}
