//! Repository abstractions for data access.
//!
//! Repositories hide the `SeaORM` details from the rest of the application.
//! [`TargetRepository`] implements the core target repository trait.

pub mod target;
pub mod user;

pub use target::TargetRepository;
pub use user::{CreateUserInput, UserRepository, to_view};
