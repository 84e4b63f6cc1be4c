//! Database enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use docket_core::target::TargetStatus as DomainStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TargetStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl From<DomainStatus> for TargetStatus {
    fn from(status: DomainStatus) -> Self {
        match status {
            DomainStatus::Pending => Self::Pending,
            DomainStatus::Completed => Self::Completed,
        }
    }
}

impl From<TargetStatus> for DomainStatus {
    fn from(status: TargetStatus) -> Self {
        match status {
            TargetStatus::Pending => Self::Pending,
            TargetStatus::Completed => Self::Completed,
        }
    }
}
