//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value.
//! Unparseable bodies are answered with 400 `INVALID_JSON`. Missing or
//! mistyped fields and rule violations get 422 `VALIDATION_ERROR` with the
//! offending field named.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ApiResponse;

/// An extractor that deserializes JSON and validates it.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct ReserveRandomSlotRequest {
///     #[validate(range(min = 1))]
///     id_floor: i32,
/// }
///
/// async fn handler(ValidatedJson(body): ValidatedJson<ReserveRandomSlotRequest>) {
///     // `body` is guaranteed to pass validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

/// Error type for `ValidatedJson` extraction failures.
pub enum ValidatedJsonRejection {
    JsonError(JsonRejection),
    ValidationError(validator::ValidationErrors),
}

fn describe(errors: &validator::ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            // Well-formed JSON with missing or mistyped fields is a
            // validation failure, not a syntax error.
            Self::JsonError(JsonRejection::JsonDataError(rejection)) => {
                let body = ApiResponse::<()>::error("VALIDATION_ERROR", rejection.body_text());
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            Self::JsonError(rejection) => {
                let body = ApiResponse::<()>::error("INVALID_JSON", format!("Invalid JSON: {}", rejection.body_text()));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            Self::ValidationError(errors) => {
                let body = ApiResponse::<()>::error("VALIDATION_ERROR", describe(&errors));
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::JsonError)?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct HoldBody {
        #[validate(range(min = 1, message = "must be a positive id"))]
        id_floor: i32,
        #[validate(length(min = 1, max = 50))]
        vehicle_type: String,
    }

    async fn handler(ValidatedJson(_body): ValidatedJson<HoldBody>) -> &'static str {
        "ok"
    }

    async fn send(body: Body) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/hold")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let resp = Router::new()
            .route("/hold", post(handler))
            .oneshot(req)
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let body = serde_json::json!({"id_floor": 3, "vehicle_type": "Roda Dua"});
        let (status, _) = send(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (status, json) = send(Body::from("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn missing_field_is_422_naming_the_field() {
        let body = serde_json::json!({"vehicle_type": "Roda Dua"});
        let (status, json) = send(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["error"].as_str().unwrap().contains("id_floor"));
    }

    #[tokio::test]
    async fn wrong_field_type_is_422() {
        let body = serde_json::json!({"id_floor": "three", "vehicle_type": "Roda Dua"});
        let (status, json) = send(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_content_type_is_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/hold")
            .body(Body::from(r#"{"id_floor": 3, "vehicle_type": "Roda Dua"}"#))
            .unwrap();
        let resp = Router::new()
            .route("/hold", post(handler))
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rule_violations_are_422_with_field_detail() {
        let body = serde_json::json!({"id_floor": 0, "vehicle_type": ""});
        let (status, json) = send(Body::from(body.to_string())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        let message = json["error"].as_str().unwrap();
        assert!(message.contains("id_floor: must be a positive id"));
        assert!(message.contains("vehicle_type: length"));
    }
}
