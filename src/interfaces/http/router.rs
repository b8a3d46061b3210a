//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::parking::ParkingServices;
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::modules::bookings;
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use crate::interfaces::http::modules::parking::{self, ParkingAppState};
use crate::interfaces::http::modules::request_id::request_id_middleware;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Parking
        parking::list_floors,
        parking::list_slots,
        parking::reserve_random_slot,
        parking::get_reservation,
        parking::cancel_reservation,
        parking::sweep_expired,
        // Administration
        parking::create_area,
        parking::create_floor,
        parking::delete_floor,
        parking::set_slot_maintenance,
        // Bookings
        bookings::create_booking,
        bookings::get_booking,
        bookings::cancel_booking,
        bookings::complete_booking,
    ),
    components(
        schemas(
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            parking::ReserveRandomSlotRequest,
            parking::CreateAreaRequest,
            parking::CreateFloorRequest,
            parking::SlotMaintenanceRequest,
            parking::FloorDto,
            parking::SlotDto,
            parking::ReservationDto,
            parking::SweepReportDto,
            parking::AreaDto,
            bookings::CreateBookingRequest,
            bookings::BookingDto,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage reachability."),
        (name = "Parking", description = "Floor and slot availability, random slot holds. A hold lasts 1–30 minutes (default 5) and is released automatically when it expires unconfirmed."),
        (name = "Parking administration", description = "Parking areas, floors with generated slots, slot maintenance."),
        (name = "Bookings", description = "Confirm a hold (`reservation_id`), occupy an explicit slot (`id_slot`), or let the service pick one. A vehicle has at most one confirmed booking."),
    ),
    info(
        title = "Mall Parking Slot Allocation API",
        version = "1.0.0",
        description = "Slot reservation and allocation for mall parking.

## Response format

Every response is wrapped in the same envelope:
```json
{\"success\": true, \"data\": {...}}
```

On failure a stable machine-readable code is included:
```json
{\"success\": false, \"data\": null, \"error\": \"No available slots on floor 3\", \"code\": \"NO_SLOTS_AVAILABLE\"}
```

Codes: `VALIDATION_ERROR` (422), `NOT_FOUND` (404), `NO_SLOTS_AVAILABLE` (404), `INVALID_RESERVATION` (400), `RESERVATION_EXPIRED` (400), `CONFLICT` (409), `ILLEGAL_TRANSITION` (409), `INTERNAL_ERROR` (500).",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `db` is only used by the health check; pass `None` when running on the
/// in-memory store. `metrics` is the Prometheus handle served on `/metrics`.
pub fn create_api_router(
    services: ParkingServices,
    db: Option<DatabaseConnection>,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let parking_state = ParkingAppState { services };

    // Slot routes share one parameter name so matchit sees a single tree.
    let parking_routes = Router::new()
        .route("/floors/{id}", get(parking::list_floors))
        .route("/slots/reserve-random", post(parking::reserve_random_slot))
        .route("/slots/{id}/visualization", get(parking::list_slots))
        .route("/slots/{id}/maintenance", put(parking::set_slot_maintenance))
        .route("/reservations/sweep", post(parking::sweep_expired))
        .route("/reservations/{reservation_id}", get(parking::get_reservation))
        .route("/reservations/{reservation_id}/cancel", put(parking::cancel_reservation))
        .route("/areas", post(parking::create_area))
        .route("/areas/{area_id}/floors", post(parking::create_floor))
        .route("/areas/{area_id}/floors/{floor_id}", delete(parking::delete_floor))
        .with_state(parking_state.clone());

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/cancel", put(bookings::cancel_booking))
        .route("/{id}/complete", put(bookings::complete_booking))
        .with_state(parking_state);

    let health_state = HealthState {
        db,
        started_at: Arc::new(Instant::now()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check).with_state(health_state))
        .route(
            "/metrics",
            get(prometheus_metrics).with_state(MetricsState { handle: metrics }),
        )
        .nest("/api/v1/parking", parking_routes)
        .nest("/api/v1/booking", booking_routes)
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::application::parking::test_support::Fixture;
    use crate::domain::SlotStatus;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn app(fx: &Fixture) -> Router {
        create_api_router(fx.services.clone(), None, None)
    }

    #[tokio::test]
    async fn reserve_then_book_through_the_api() {
        let fx = Fixture::new();
        let area = fx.area(50).await;
        let floor = fx.floor(area.id, 1, "Roda Empat", 3).await;
        let vehicle = fx.vehicle("Roda Empat");
        let app = app(&fx);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/parking/slots/reserve-random",
            Some(json!({"id_floor": floor.floor.id, "id_user": 1, "vehicle_type": "Roda Empat"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let reservation_id = body["data"]["reservation_id"].as_str().unwrap().to_string();
        let slot_id = body["data"]["id_slot"].as_i64().unwrap() as i32;
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(fx.slot_status(slot_id).await, SlotStatus::Reserved);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/booking",
            Some(json!({
                "id_parkiran": area.id,
                "id_kendaraan": vehicle,
                "waktu_mulai": "2025-03-01 10:05:00",
                "durasi_booking": 120,
                "reservation_id": reservation_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "confirmed");
        assert_eq!(body["data"]["id_slot"], slot_id);
        assert_eq!(fx.slot_status(slot_id).await, SlotStatus::Occupied);

        let (status, body) = call(&app, "GET", &format!("/api/v1/parking/floors/{}", area.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["occupied"], 1);
        assert_eq!(body["data"][0]["available"], 2);
    }

    #[tokio::test]
    async fn empty_floor_reports_no_slots_available() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let app = app(&fx);
        let request = json!({"id_floor": floor.floor.id, "id_user": 1, "vehicle_type": "Roda Dua"});

        let (first, _) = call(&app, "POST", "/api/v1/parking/slots/reserve-random", Some(request.clone())).await;
        let (second, body) = call(&app, "POST", "/api/v1/parking/slots/reserve-random", Some(request)).await;
        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NO_SLOTS_AVAILABLE");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn hold_longer_than_thirty_minutes_is_422() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let (status, body) = call(
            &app(&fx),
            "POST",
            "/api/v1/parking/slots/reserve-random",
            Some(json!({"id_floor": floor.floor.id, "id_user": 1, "vehicle_type": "Roda Dua", "duration_minutes": 31})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_required_fields_are_422() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Dua", 1).await;
        let vehicle = fx.vehicle("Roda Dua");
        let app = app(&fx);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/parking/slots/reserve-random",
            Some(json!({"id_user": 1, "vehicle_type": "Roda Dua"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("id_floor"));

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/booking",
            Some(json!({
                "id_parkiran": area.id,
                "id_kendaraan": vehicle,
                "waktu_mulai": "2025-03-01T10:05:00Z",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("durasi_booking"));
    }

    #[tokio::test]
    async fn stale_reservation_is_rejected_with_400() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Empat", 1).await;
        let vehicle = fx.vehicle("Roda Empat");
        let app = app(&fx);

        let (_, body) = call(
            &app,
            "POST",
            "/api/v1/parking/slots/reserve-random",
            Some(json!({"id_floor": floor.floor.id, "id_user": 1, "vehicle_type": "Roda Empat", "duration_minutes": 1})),
        )
        .await;
        let reservation_id = body["data"]["reservation_id"].as_str().unwrap().to_string();

        fx.clock.advance(Duration::minutes(2));
        let (status, body) = call(&app, "POST", "/api/v1/parking/reservations/sweep", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["released"], 1);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/booking",
            Some(json!({
                "id_parkiran": area.id,
                "id_kendaraan": vehicle,
                "waktu_mulai": "2025-03-01T10:05:00Z",
                "durasi_booking": 60,
                "reservation_id": reservation_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "RESERVATION_EXPIRED");
    }

    #[tokio::test]
    async fn unknown_reservation_id_is_invalid_reservation() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Empat", 1).await;
        let vehicle = fx.vehicle("Roda Empat");
        let (status, body) = call(
            &app(&fx),
            "POST",
            "/api/v1/booking",
            Some(json!({
                "id_parkiran": area.id,
                "id_kendaraan": vehicle,
                "waktu_mulai": "2025-03-01T10:05:00Z",
                "durasi_booking": 60,
                "reservation_id": "5b0c7c43-64a0-4d1e-8d1f-0f6f0e1d2c3b",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_RESERVATION");
    }

    #[tokio::test]
    async fn booking_can_be_cancelled_and_read_back() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Empat", 2).await;
        let vehicle = fx.vehicle("Roda Empat");
        let app = app(&fx);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/booking",
            Some(json!({
                "id_parkiran": area.id,
                "id_kendaraan": vehicle,
                "waktu_mulai": "2025-03-01T10:05:00Z",
                "durasi_booking": 60,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id_booking"].as_i64().unwrap();
        let slot_id = body["data"]["id_slot"].as_i64().unwrap() as i32;

        let (status, body) = call(&app, "PUT", &format!("/api/v1/booking/{id}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");
        assert_eq!(fx.slot_status(slot_id).await, SlotStatus::Available);

        let (status, _) = call(&app, "PUT", &format!("/api/v1/booking/{id}/complete"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&app, "GET", &format!("/api/v1/booking/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");

        let (status, body) = call(&app, "PUT", "/api/v1/booking/9999/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn administration_routes_manage_floors_and_slots() {
        let fx = Fixture::new();
        let app = app(&fx);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/parking/areas",
            Some(json!({"mall_id": 1, "name": "Parkiran Timur", "capacity": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let area_id = body["data"]["id_parkiran"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/parking/areas/{area_id}/floors"),
            Some(json!({
                "floor_number": 1,
                "name": "Lantai 1",
                "slot_vehicle_type": "Roda Dua",
                "slot_count": 4,
                "code_prefix": "T1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["total"], 4);
        let floor_id = body["data"]["id_floor"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/v1/parking/slots/{floor_id}/visualization?vehicle_type=Roda%20Dua"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"][0]["code"], "T1-001");
        let slot_id = body["data"][0]["id_slot"].as_i64().unwrap();

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/v1/parking/slots/{slot_id}/maintenance"),
            Some(json!({"maintenance": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "maintenance");

        let (status, _) = call(
            &app,
            "DELETE",
            &format!("/api/v1/parking/areas/{area_id}/floors/{floor_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, "GET", &format!("/api/v1/parking/floors/{area_id}"), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_reservation_path_is_not_found() {
        let fx = Fixture::new();
        let (status, body) = call(&app(&fx), "GET", "/api/v1/parking/reservations/xyz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn health_and_docs_are_served() {
        let fx = Fixture::new();
        let app = app(&fx);

        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storage"]["backend"], "memory");

        let (status, body) = call(&app, "GET", "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/booking"].is_object());

        let (status, _) = call(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
