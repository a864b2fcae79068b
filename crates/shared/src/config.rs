use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// 永続化の実装の選択
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_addr: String,
    pub rpc_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub storage: StorageBackend,
    pub todo_ttl: Duration,
    pub cleanup_interval: Duration,
    pub static_dir: String,
    pub log_format: LogFormat,
}

impl Config {
    /// 環境変数（と `.env` ファイル）から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env が無いのは正常（既定値で起動する）
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let storage = match get("STORAGE_BACKEND", "redis").to_ascii_lowercase().as_str() {
            "redis" => StorageBackend::Redis,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let log_format = match get("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            redis_addr: get("REDIS_ADDR", "localhost:6379"),
            rpc_addr: parse_listen_addr("RPC_ADDR", &get("RPC_ADDR", ":50051"))?,
            http_addr: parse_listen_addr("HTTP_ADDR", &get("HTTP_ADDR", ":80"))?,
            storage,
            todo_ttl: parse_secs("TODO_TTL_SECS", &get("TODO_TTL_SECS", "900"))?,
            cleanup_interval: parse_secs(
                "CLEANUP_INTERVAL_SECS",
                &get("CLEANUP_INTERVAL_SECS", "900"),
            )?,
            static_dir: get("STATIC_DIR", "static"),
            log_format,
        })
    }
}

/// `:50051` のようにホストを省略した場合は全インターフェースで待ち受ける
pub fn parse_listen_addr(key: &'static str, raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    let full = if raw.starts_with(':') {
        format!("0.0.0.0{raw}")
    } else {
        raw.to_string()
    };
    full.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
