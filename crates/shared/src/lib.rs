//! Shared types, errors, and configuration for Docket.
//!
//! This crate provides common types used across all other crates:
//! - Wire DTOs for targets and the upload protocol
//! - JWT claims and token service
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod target;
pub mod upload;

pub use auth::{Claims, TOKEN_ISSUER};
pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
