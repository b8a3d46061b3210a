//! Parking inventory and reservation handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::application::parking::{
    CreateAreaCommand, CreateFloorCommand, ParkingServices, ReserveSlotCommand,
};
use crate::domain::DomainError;
use crate::interfaces::http::common::{created, ApiResponse, ApiResult, EmptyData, ValidatedJson};

use super::dto::*;

/// State shared by the parking and booking routes.
#[derive(Clone)]
pub struct ParkingAppState {
    pub services: ParkingServices,
}

/// Unparseable reservation ids name no reservation.
fn parse_reservation_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| DomainError::not_found("reservation", "reservation_id", raw))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking/floors/{area_id}",
    tag = "Parking",
    params(("area_id" = i32, Path, description = "Parking area ID")),
    responses(
        (status = 200, description = "Active floors with live counts", body = ApiResponse<Vec<FloorDto>>)
    )
)]
pub async fn list_floors(
    State(state): State<ParkingAppState>,
    Path(area_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Vec<FloorDto>>>> {
    let floors = state.services.inventory.list_floors(area_id).await?;
    Ok(Json(ApiResponse::success(
        floors.into_iter().map(FloorDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking/slots/{floor_id}/visualization",
    tag = "Parking",
    params(
        ("floor_id" = i32, Path, description = "Floor ID"),
        SlotFilterQuery
    ),
    responses(
        (status = 200, description = "Slots of the floor ordered by code", body = ApiResponse<Vec<SlotDto>>)
    )
)]
pub async fn list_slots(
    State(state): State<ParkingAppState>,
    Path(floor_id): Path<i32>,
    Query(query): Query<SlotFilterQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SlotDto>>>> {
    let slots = state
        .services
        .inventory
        .list_slots(floor_id, query.vehicle_type.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(
        slots.into_iter().map(SlotDto::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/slots/reserve-random",
    tag = "Parking",
    request_body = ReserveRandomSlotRequest,
    responses(
        (status = 201, description = "Slot held", body = ApiResponse<ReservationDto>),
        (status = 404, description = "NO_SLOTS_AVAILABLE or unknown floor"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn reserve_random_slot(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<ReserveRandomSlotRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ReservationDto>>)> {
    let summary = state
        .services
        .allocation
        .reserve_random_slot(ReserveSlotCommand {
            floor_id: request.id_floor,
            user_id: request.id_user,
            vehicle_type: request.vehicle_type,
            duration_minutes: request.duration_minutes,
        })
        .await?;
    Ok(created(ReservationDto::from(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/parking/reservations/{reservation_id}",
    tag = "Parking",
    params(("reservation_id" = String, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Reservation", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ParkingAppState>,
    Path(reservation_id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let id = parse_reservation_id(&reservation_id)?;
    let summary = state.services.allocation.get_reservation(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/parking/reservations/{reservation_id}/cancel",
    tag = "Parking",
    params(("reservation_id" = String, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Reservation cancelled, slot released", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is no longer active")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ParkingAppState>,
    Path(reservation_id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let id = parse_reservation_id(&reservation_id)?;
    let summary = state.services.allocation.cancel_reservation(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/reservations/sweep",
    tag = "Parking",
    responses(
        (status = 200, description = "Expired holds released", body = ApiResponse<SweepReportDto>)
    )
)]
pub async fn sweep_expired(
    State(state): State<ParkingAppState>,
) -> ApiResult<Json<ApiResponse<SweepReportDto>>> {
    let report = state.services.sweeper.sweep_expired().await?;
    Ok(Json(ApiResponse::success(report.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/areas",
    tag = "Parking administration",
    request_body = CreateAreaRequest,
    responses(
        (status = 201, description = "Parking area created", body = ApiResponse<AreaDto>),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_area(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<CreateAreaRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AreaDto>>)> {
    let area = state
        .services
        .inventory
        .create_area(CreateAreaCommand {
            mall_id: request.mall_id,
            name: request.name,
            capacity: request.capacity,
        })
        .await?;
    Ok(created(AreaDto::from(area)))
}

#[utoipa::path(
    post,
    path = "/api/v1/parking/areas/{area_id}/floors",
    tag = "Parking administration",
    params(("area_id" = i32, Path, description = "Parking area ID")),
    request_body = CreateFloorRequest,
    responses(
        (status = 201, description = "Floor and its slots created", body = ApiResponse<FloorDto>),
        (status = 404, description = "Parking area not found"),
        (status = 409, description = "Floor number already used"),
        (status = 422, description = "Validation error or capacity exceeded")
    )
)]
pub async fn create_floor(
    State(state): State<ParkingAppState>,
    Path(area_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<CreateFloorRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<FloorDto>>)> {
    let summary = state
        .services
        .inventory
        .create_floor(CreateFloorCommand {
            parking_area_id: area_id,
            floor_number: request.floor_number,
            name: request.name,
            vehicle_type: request.vehicle_type,
            slot_vehicle_type: request.slot_vehicle_type,
            slot_count: request.slot_count,
            code_prefix: request.code_prefix,
        })
        .await?;
    Ok(created(FloorDto::from(summary)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/parking/areas/{area_id}/floors/{floor_id}",
    tag = "Parking administration",
    params(
        ("area_id" = i32, Path, description = "Parking area ID"),
        ("floor_id" = i32, Path, description = "Floor ID")
    ),
    responses(
        (status = 200, description = "Floor deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Floor not found in this area"),
        (status = 409, description = "Floor still has reserved or occupied slots")
    )
)]
pub async fn delete_floor(
    State(state): State<ParkingAppState>,
    Path((area_id, floor_id)): Path<(i32, i32)>,
) -> ApiResult<Json<ApiResponse<EmptyData>>> {
    state.services.inventory.delete_floor(area_id, floor_id).await?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}

#[utoipa::path(
    put,
    path = "/api/v1/parking/slots/{slot_id}/maintenance",
    tag = "Parking administration",
    params(("slot_id" = i32, Path, description = "Slot ID")),
    request_body = SlotMaintenanceRequest,
    responses(
        (status = 200, description = "Slot updated", body = ApiResponse<SlotDto>),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Slot is reserved or occupied")
    )
)]
pub async fn set_slot_maintenance(
    State(state): State<ParkingAppState>,
    Path(slot_id): Path<i32>,
    Json(request): Json<SlotMaintenanceRequest>,
) -> ApiResult<Json<ApiResponse<SlotDto>>> {
    let slot = state
        .services
        .inventory
        .set_slot_maintenance(slot_id, request.maintenance)
        .await?;
    Ok(Json(ApiResponse::success(slot.into())))
}
