use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "role")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: RoleName,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_role::Entity")]
    UserRole,
}

impl Related<super::user_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRole.def()
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    EnumIter,
    DeriveActiveEnum,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleName {
    #[sea_orm(string_value = "ANALYST")]
    Analyst,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl RoleName {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleName::Analyst => "ANALYST",
            RoleName::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ANALYST" => Some(RoleName::Analyst),
            "ADMIN" => Some(RoleName::Admin),
            _ => None,
        }
    }

    /// Admins can do everything analysts can.
    pub fn level(self) -> u8 {
        match self {
            RoleName::Admin => 2,
            RoleName::Analyst => 1,
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
