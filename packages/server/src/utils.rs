pub mod auth;
pub mod config;
pub mod random;
pub mod test_setup;
pub mod websocket;
