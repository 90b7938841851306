//! # Encore Common Library
//!
//! Shared code for the Encore client and catalog proxy:
//! - Error type
//! - Configuration loading
//! - Domain rows (favorites, posts, profiles, follows, concerts)
//! - Catalog search types and music-link building
//! - Authentication session context
//! - Local SQLite schema

pub mod catalog;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod session;

pub use error::{Error, Result};
pub use session::{AuthEvent, Session, SessionContext};
