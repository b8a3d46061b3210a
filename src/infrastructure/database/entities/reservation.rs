//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Public UUID, hyphenated lowercase
    #[sea_orm(unique)]
    pub reservation_id: String,

    pub slot_id: i32,
    pub user_id: i32,
    pub floor_id: i32,

    /// active | confirmed | expired | cancelled
    pub status: String,

    pub reserved_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub confirmed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::slot::Entity",
        from = "Column::SlotId",
        to = "super::slot::Column::Id"
    )]
    Slot,
}

impl Related<super::slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
