use axum::Router;

pub mod balances;
pub mod expenses;
pub mod system;
pub mod users;

/// Router for all application endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/expenses", expenses::router())
        .nest("/balances", balances::router())
}
