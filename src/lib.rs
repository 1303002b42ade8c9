pub mod auth;
pub mod cli;
pub mod config;

pub use auth::AuthError;
pub use config::{Config, Secret};
