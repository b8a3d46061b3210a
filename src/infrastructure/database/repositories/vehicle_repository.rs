//! SeaORM implementation of VehicleRepository

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use super::helpers::db_err;
use crate::domain::vehicle::{Vehicle, VehicleRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::vehicle;

pub struct SeaOrmVehicleRepository {
    db: DatabaseConnection,
}

impl SeaOrmVehicleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: vehicle::Model) -> Vehicle {
    Vehicle {
        id: m.id,
        user_id: m.user_id,
        plate_number: m.plate_number,
        vehicle_type: m.vehicle_type,
    }
}

#[async_trait]
impl VehicleRepository for SeaOrmVehicleRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        let model = vehicle::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }
}
