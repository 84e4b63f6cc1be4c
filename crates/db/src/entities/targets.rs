//! `SeaORM` Entity for targets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TargetStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "targets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// JSON array of strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub assigned_date: DateTimeWithTimeZone,
    pub target_date: DateTimeWithTimeZone,
    pub document_count: i32,
    pub status: TargetStatus,
    pub score: Option<i32>,
    pub assigned_to: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedTo",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::target_files::Entity")]
    TargetFiles,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::target_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TargetFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
