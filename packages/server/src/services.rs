pub mod game_registry;
pub mod game_service;
pub mod user_service;
