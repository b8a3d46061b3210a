//! Parking area entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_areas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning mall (collaborator record, not stored here)
    pub mall_id: i32,
    pub name: String,
    pub capacity: i32,

    /// available | closed
    pub status: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::floor::Entity")]
    Floor,
}

impl Related<super::floor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Floor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
