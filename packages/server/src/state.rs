use std::sync::Arc;

use crate::services::{game_registry::GameRegistry, user_service::UserService};
use crate::utils::config::{ServerConfig, CONFIG};
use crate::utils::random::{std_random_factory, RandomFactory};

#[derive(Clone)]
pub struct AppState {
    pub games: GameRegistry,
    pub user_service: UserService,
    pub random: RandomFactory,
    pub config: Arc<ServerConfig>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_random(std_random_factory())
    }

    pub fn with_random(random: RandomFactory) -> Self {
        Self::with_config(CONFIG.clone(), random)
    }

    pub fn with_config(config: ServerConfig, random: RandomFactory) -> Self {
        AppState {
            games: GameRegistry::new(config.observer_capacity, config.slow_subscriber_policy),
            user_service: UserService::new(),
            random,
            config: Arc::new(config),
        }
    }
}
