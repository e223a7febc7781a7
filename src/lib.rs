//! SisBib library management backend
//!
//! REST JSON API for a small library: catalog of books and copies, pickup
//! requests, loans with due dates, returns with late-return sanctions, and
//! weekly overdue notices by mail.

use std::sync::Arc;

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
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
