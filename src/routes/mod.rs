pub mod graphql;

use axum::routing::get;
use axum::Router;

pub use graphql::GraphqlState;

async fn healthz() -> &'static str {
    "ok"
}

pub fn router(state: GraphqlState) -> Router {
    Router::new()
        .route("/graphql", graphql::router())
        .route("/healthz", get(healthz))
        .with_state(state)
}
