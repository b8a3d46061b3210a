//! Floor entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "floors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub parking_area_id: i32,

    /// Negative numbers are basements
    pub floor_number: i32,
    pub name: String,

    #[sea_orm(nullable)]
    pub vehicle_type: Option<String>,

    pub total_slots: i32,
    pub available_slots: i32,

    /// active | inactive | maintenance
    pub status: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_area::Entity",
        from = "Column::ParkingAreaId",
        to = "super::parking_area::Column::Id"
    )]
    ParkingArea,
    #[sea_orm(has_many = "super::slot::Entity")]
    Slot,
}

impl Related<super::parking_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParkingArea.def()
    }
}

impl Related<super::slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
