use std::env;

use crate::error::AppError;

const DEFAULT_BASE_ADDRESS: &str = "Vecht en Gein 28, 1393 PZ Nigtevecht, Nederland";

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// Fixed start and end point of every computed route.
    pub base_address: String,
    pub routing_url: String,
    pub routing_api_key: Option<String>,
    pub plan_debounce_ms: u64,
    pub plan_queue_size: usize,
    pub event_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            base_address: env::var("BASE_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BASE_ADDRESS.to_string()),
            routing_url: env::var("ROUTING_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            routing_api_key: env::var("ROUTING_API_KEY").ok(),
            plan_debounce_ms: parse_or_default("PLAN_DEBOUNCE_MS", 450)?,
            plan_queue_size: parse_or_default("PLAN_QUEUE_SIZE", 64)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
