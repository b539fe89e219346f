use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use splitledger_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user))
        .route("/by-email", get(get_user_by_email))
        .route("/:id", get(get_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateUserRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_error(rejection.status(), "invalid_body", rejection.body_text()),
    };

    match services.expenses.create_user(&body.name, &body.email).await {
        Ok(user) => (StatusCode::CREATED, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("{e}")),
    };

    match services.expenses.get_user(id).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::EmailQuery>,
) -> axum::response::Response {
    match services.expenses.get_user_by_email(&query.email).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
