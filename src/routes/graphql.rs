use std::time::Duration;

use async_graphql::http::GraphiQLSource;
use async_graphql::{ErrorExtensions, Response, ServerError};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, MethodRouter};
use axum::Json;

use crate::error::ApiError;
use crate::graphql::{AppSchema, BearerHeader};

#[derive(Clone)]
pub struct GraphqlState {
    pub schema: AppSchema,
    pub timeout: Duration,
}

#[tracing::instrument(level = "debug", skip_all)]
async fn execute(
    State(state): State<GraphqlState>,
    headers: HeaderMap,
    Json(request): Json<async_graphql::Request>,
) -> Json<Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let request = request.data(BearerHeader(bearer));

    match tokio::time::timeout(state.timeout, state.schema.execute(request)).await {
        Ok(resp) => Json(resp),
        Err(_) => {
            let timeout_ms = state.timeout.as_millis() as u64;
            tracing::warn!(timeout_ms, "graphql request timed out");
            Json(Response::from_errors(vec![timeout_error()]))
        }
    }
}

pub(crate) fn timeout_error() -> ServerError {
    let err = ApiError::Timeout.extend();
    let mut server_err = ServerError::new(err.message, None);
    server_err.extensions = err.extensions;
    server_err
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

pub fn router() -> MethodRouter<GraphqlState> {
    get(graphiql).post(execute)
}
