use once_cell::sync::Lazy;
use std::env;

use crate::models::event_bus::{SlowSubscriberPolicy, DEFAULT_CAPACITY};

pub static CONFIG: Lazy<ServerConfig> = Lazy::new(ServerConfig::from_env);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    // 購読者ごとの通知キューの長さ
    pub observer_capacity: usize,
    pub slow_subscriber_policy: SlowSubscriberPolicy,
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            jwt_secret: "SECRET".to_string(),
            token_ttl_hours: 24,
            observer_capacity: DEFAULT_CAPACITY,
            slow_subscriber_policy: SlowSubscriberPolicy::Wait,
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("SERVER_HOST").unwrap_or(defaults.host);
        let port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.jwt_secret);
        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.token_ttl_hours);
        let observer_capacity = env::var("OBSERVER_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.observer_capacity);
        let slow_subscriber_policy = env::var("SLOW_SUBSCRIBER_POLICY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.slow_subscriber_policy);
        let allowed_origin = env::var("CORS_ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);

        Self {
            host,
            port,
            jwt_secret,
            token_ttl_hours,
            observer_capacity,
            slow_subscriber_policy,
            allowed_origin,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
