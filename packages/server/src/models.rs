pub mod config;
pub mod event_bus;
pub mod game;
pub mod player;
pub mod role;
pub mod rule;
pub mod state_change;
pub mod user;
pub mod view;
