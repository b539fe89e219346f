use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_expense))
        .route("/by-user/:email", get(list_user_expenses))
}

pub async fn create_expense(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateExpenseRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_error(rejection.status(), "invalid_body", rejection.body_text()),
    };

    match services.expenses.create_expense(body).await {
        Ok(recorded) => (StatusCode::CREATED, Json(dto::recorded_expense_to_json(recorded))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_user_expenses(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    match services.expenses.expenses_for_user(&email).await {
        Ok(views) => {
            let items = views.into_iter().map(dto::expense_view_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
