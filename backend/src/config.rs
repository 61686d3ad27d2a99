use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

use crate::game::Rules;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as the fallback for non-API paths
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub compound_words_path: String,
    pub hand_size: usize,
    pub replacement_draws: usize,
}

impl Default for Config {
    fn default() -> Self {
        let rules = Rules::default();
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                static_dir: "./public".to_string(),
            },
            game: GameConfig {
                compound_words_path: "./compound_words.json".to_string(),
                hand_size: rules.hand_size,
                replacement_draws: rules.replacement_draws,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or(defaults.server.host),
            port: parse_port(env::var("PORT").ok(), defaults.server.port)?,
            static_dir: env::var("STATIC_DIR")
                .unwrap_or(defaults.server.static_dir),
        };

        let game = GameConfig {
            compound_words_path: env::var("COMPOUND_WORDS_PATH")
                .unwrap_or(defaults.game.compound_words_path),
            hand_size: env::var("HAND_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.game.hand_size),
            replacement_draws: env::var("REPLACEMENT_DRAWS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.game.replacement_draws),
        };

        Ok(Config { server, game })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            hand_size: self.game.hand_size,
            replacement_draws: self.game.replacement_draws,
        }
    }
}

/// An unset PORT falls back to the default; a set but malformed one is an error
fn parse_port(value: Option<String>, default: u16) -> Result<u16> {
    match value {
        Some(v) => v.parse().context("PORT must be a number"),
        None => Ok(default),
    }
}
