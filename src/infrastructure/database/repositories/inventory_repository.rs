//! SeaORM implementation of InventoryRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use tracing::debug;

use super::helpers::{corrupt, db_err, move_slot};
use crate::domain::inventory::{
    Floor, FloorStatus, InventoryRepository, NewFloor, NewParkingArea, NewSlot, ParkingArea, Slot, SlotScope,
    SlotStatus,
};
use crate::domain::{DomainResult, StatusMachine, Transition};
use crate::infrastructure::database::entities::{booking, floor, parking_area, reservation, slot};

pub struct SeaOrmInventoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmInventoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn area_to_domain(m: parking_area::Model) -> DomainResult<ParkingArea> {
    Ok(ParkingArea {
        id: m.id,
        mall_id: m.mall_id,
        name: m.name,
        capacity: m.capacity,
        status: m.status.parse().map_err(|e| corrupt("parking_areas.status", e))?,
        created_at: m.created_at,
    })
}

fn floor_to_domain(m: floor::Model) -> DomainResult<Floor> {
    Ok(Floor {
        id: m.id,
        parking_area_id: m.parking_area_id,
        floor_number: m.floor_number,
        name: m.name,
        vehicle_type: m.vehicle_type,
        total_slots: m.total_slots,
        available_slots: m.available_slots,
        status: m.status.parse().map_err(|e| corrupt("floors.status", e))?,
        created_at: m.created_at,
    })
}

fn slot_to_domain(m: slot::Model) -> DomainResult<Slot> {
    Ok(Slot {
        id: m.id,
        floor_id: m.floor_id,
        code: m.code,
        vehicle_type: m.vehicle_type,
        position_x: m.position_x,
        position_y: m.position_y,
        status: m.status.parse().map_err(|e| corrupt("slots.status", e))?,
        updated_at: m.updated_at,
    })
}

fn slots_to_domain(models: Vec<slot::Model>) -> DomainResult<Vec<Slot>> {
    models.into_iter().map(slot_to_domain).collect()
}

// ── InventoryRepository impl ────────────────────────────────────

#[async_trait]
impl InventoryRepository for SeaOrmInventoryRepository {
    async fn create_area(&self, area: NewParkingArea) -> DomainResult<ParkingArea> {
        let model = parking_area::ActiveModel {
            id: NotSet,
            mall_id: Set(area.mall_id),
            name: Set(area.name),
            capacity: Set(area.capacity),
            status: Set(area.status.as_str().to_string()),
            created_at: Set(area.created_at),
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        area_to_domain(saved)
    }

    async fn find_area(&self, id: i32) -> DomainResult<Option<ParkingArea>> {
        parking_area::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(area_to_domain)
            .transpose()
    }

    async fn create_floor(&self, new: NewFloor, slots: Vec<NewSlot>) -> DomainResult<Floor> {
        debug!(area_id = new.parking_area_id, floor_number = new.floor_number, slots = slots.len(), "Creating floor");

        let txn = self.db.begin().await.map_err(db_err)?;
        let total = slots.len() as i32;

        let saved = floor::ActiveModel {
            id: NotSet,
            parking_area_id: Set(new.parking_area_id),
            floor_number: Set(new.floor_number),
            name: Set(new.name),
            vehicle_type: Set(new.vehicle_type),
            total_slots: Set(total),
            available_slots: Set(total),
            status: Set(new.status.as_str().to_string()),
            created_at: Set(new.created_at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if !slots.is_empty() {
            let rows = slots.into_iter().map(|s| slot::ActiveModel {
                id: NotSet,
                floor_id: Set(saved.id),
                code: Set(s.code),
                vehicle_type: Set(s.vehicle_type),
                position_x: Set(s.position_x),
                position_y: Set(s.position_y),
                status: Set(SlotStatus::Available.as_str().to_string()),
                updated_at: Set(new.created_at),
            });
            slot::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        floor_to_domain(saved)
    }

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>> {
        floor::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(floor_to_domain)
            .transpose()
    }

    async fn list_floors(&self, area_id: i32) -> DomainResult<Vec<Floor>> {
        floor::Entity::find()
            .filter(floor::Column::ParkingAreaId.eq(area_id))
            .order_by_asc(floor::Column::FloorNumber)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(floor_to_domain)
            .collect()
    }

    async fn delete_floor_if_idle(&self, id: i32) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let busy = Query::select()
            .expr(Expr::val(1))
            .from(slot::Entity)
            .and_where(slot::Column::FloorId.eq(id))
            .and_where(slot::Column::Status.is_in([
                SlotStatus::Reserved.as_str(),
                SlotStatus::Occupied.as_str(),
            ]))
            .to_owned();
        let deleted = floor::Entity::delete_many()
            .filter(floor::Column::Id.eq(id))
            .filter(Expr::exists(busy).not())
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if deleted.rows_affected == 0 {
            return Ok(false);
        }

        // Same effect as the foreign-key cascades, for connections that
        // do not enforce them.
        let floor_slots = Query::select()
            .column(slot::Column::Id)
            .from(slot::Entity)
            .and_where(slot::Column::FloorId.eq(id))
            .to_owned();
        reservation::Entity::delete_many()
            .filter(reservation::Column::SlotId.in_subquery(floor_slots.clone()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        booking::Entity::update_many()
            .col_expr(booking::Column::SlotId, Expr::value(Option::<i32>::None))
            .filter(booking::Column::SlotId.in_subquery(floor_slots))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        slot::Entity::delete_many()
            .filter(slot::Column::FloorId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn find_slot(&self, id: i32) -> DomainResult<Option<Slot>> {
        slot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(slot_to_domain)
            .transpose()
    }

    async fn list_slots(
        &self,
        floor_id: i32,
        vehicle_type: Option<&str>,
    ) -> DomainResult<Vec<Slot>> {
        let mut query = slot::Entity::find().filter(slot::Column::FloorId.eq(floor_id));
        if let Some(vehicle_type) = vehicle_type {
            query = query.filter(slot::Column::VehicleType.eq(vehicle_type));
        }
        let models = query
            .order_by_asc(slot::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        slots_to_domain(models)
    }

    async fn find_available_slots(
        &self,
        scope: SlotScope,
        vehicle_type: &str,
    ) -> DomainResult<Vec<Slot>> {
        let query = slot::Entity::find()
            .filter(slot::Column::Status.eq(SlotStatus::Available.as_str()))
            .filter(slot::Column::VehicleType.eq(vehicle_type));

        let query = match scope {
            SlotScope::Floor(floor_id) => query.filter(slot::Column::FloorId.eq(floor_id)),
            SlotScope::Area(area_id) => query
                .join(JoinType::InnerJoin, slot::Relation::Floor.def())
                .filter(floor::Column::ParkingAreaId.eq(area_id))
                .filter(floor::Column::Status.eq(FloorStatus::Active.as_str()))
                .filter(
                    Condition::any()
                        .add(floor::Column::VehicleType.is_null())
                        .add(floor::Column::VehicleType.eq(vehicle_type)),
                ),
        };

        let models = query.all(&self.db).await.map_err(db_err)?;
        slots_to_domain(models)
    }

    async fn transition_slot(
        &self,
        slot_id: i32,
        transition: Transition<SlotStatus>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let moved = move_slot(&txn, slot_id, transition, at).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(moved)
    }
}
