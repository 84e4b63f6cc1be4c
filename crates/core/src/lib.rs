//! Core business logic for Docket.
//!
//! This crate contains the domain rules with ZERO web or database
//! dependencies. Persistence is reached through [`target::TargetRepository`]
//! and object storage through [`storage::ObjectStore`].
//!
//! # Modules
//!
//! - `auth` - Password hashing and registration rules
//! - `storage` - OpenDAL-backed object storage
//! - `target` - Targets, quotas and completion
//! - `upload` - Presigned grants, confirmation and server-mediated uploads

pub mod auth;
pub mod storage;
pub mod target;
pub mod upload;

#[cfg(test)]
mod testing;
