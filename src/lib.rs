// Library root for the multi-tenant property dashboard API

pub mod api;
pub mod config;
pub mod core;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::fallback::FallbackProperties;
pub use crate::config::state::AppState;
pub use crate::core::server::create_app;
pub use crate::database::DatabaseService;
