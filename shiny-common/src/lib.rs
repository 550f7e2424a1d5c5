//! # Shiny Admin Common Library
//!
//! Shared code for the Shiny Admin service and its administrative CLI:
//! - Database initialization, schema and migrations
//! - Models for users, groups, run preferences and sessions
//! - Stores (queries) for each entity
//! - Preference filter resolution
//! - Password hashing and form validation
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod groups;
pub mod password;
pub mod preferences;
pub mod reset_tokens;
pub mod sessions;
pub mod users;
pub mod validation;

pub use error::{Error, FieldErrors, Result};
