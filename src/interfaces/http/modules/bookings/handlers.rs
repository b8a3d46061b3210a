//! Booking handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::interfaces::http::common::{created, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::parking::ParkingAppState;

use super::dto::*;

#[utoipa::path(
    post,
    path = "/api/v1/booking",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = ApiResponse<BookingDto>),
        (status = 400, description = "INVALID_RESERVATION or RESERVATION_EXPIRED"),
        (status = 404, description = "NO_SLOTS_AVAILABLE, unknown vehicle or area"),
        (status = 409, description = "Vehicle already booked or slot taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_booking(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<BookingDto>>)> {
    let command = request.into_command()?;
    let summary = state.services.booking.create_booking(command).await?;
    Ok(created(BookingDto::from(summary)))
}

#[utoipa::path(
    get,
    path = "/api/v1/booking/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<ParkingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<BookingDto>>> {
    let summary = state.services.booking.get_booking(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/booking/{id}/cancel",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled, slot released", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is already closed")
    )
)]
pub async fn cancel_booking(
    State(state): State<ParkingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<BookingDto>>> {
    let summary = state.services.booking.cancel_booking(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/booking/{id}/complete",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking completed (selesai), slot released", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is already closed")
    )
)]
pub async fn complete_booking(
    State(state): State<ParkingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<BookingDto>>> {
    let summary = state.services.booking.complete_booking(id).await?;
    Ok(Json(ApiResponse::success(summary.into())))
}
