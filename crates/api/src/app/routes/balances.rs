use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/by-user/:email", get(list_user_balances))
}

/// Positive `amount`: the user owes the counterparty. Negative: the counterparty owes the user.
pub async fn list_user_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> axum::response::Response {
    match services.expenses.balances_for_user(&email).await {
        Ok(views) => {
            let items = views.into_iter().map(dto::balance_view_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
