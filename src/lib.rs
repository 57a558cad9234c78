//! Library Management Server
//!
//! A REST JSON API for managing a library's books, authors, users,
//! user profiles and book loans, with per-book copy inventory.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: std::sync::Arc<services::Services>,
}
