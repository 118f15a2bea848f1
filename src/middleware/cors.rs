use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{self, CorsLayer};

pub trait CorsExt<S> {
    fn with_cors(self, origins: &[String]) -> Router<S>;
}

impl<S> CorsExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Add CORS to Router. An empty origin list allows any origin.
    fn with_cors(self, origins: &[String]) -> Router<S> {
        let allowed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        let allow_origin = if allowed.is_empty() {
            cors::AllowOrigin::any()
        } else {
            cors::AllowOrigin::list(allowed)
        };

        let cors_layer = CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any);

        self.layer(cors_layer)
    }
}
