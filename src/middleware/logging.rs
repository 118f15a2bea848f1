use std::time::Duration;

use axum::http::{Request, Response};
use axum::Router;

pub trait HttpLoggingExt<S> {
    fn with_http_logging(self) -> Self;
}

impl<S> HttpLoggingExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Add HTTP logging to Router
    fn with_http_logging(self) -> Router<S> {
        self.layer(
            tower_http::trace::TraceLayer::new_for_http()
                .on_request(|request: &Request<_>, _span: &_| {
                    tracing::info!(
                        target: "tower_http",
                        method = %request.method(),
                        path = %request.uri().path(),
                    );
                })
                .on_response(|response: &Response<_>, latency: Duration, _span: &_| {
                    tracing::info!(
                        target: "tower_http",
                        status = %response.status(),
                        latency_ms = latency.as_millis() as u64,
                    )
                }),
        )
    }
}
