//! `SeaORM` entity definitions.

pub mod sea_orm_active_enums;
pub mod target_files;
pub mod targets;
pub mod users;
