use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info_span, Span};

use crate::error::panic_response;
use crate::handlers::{create_url_handler, delete_url_handler, health_handler, resolve_url_handler};
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct App {}

impl App {
    /// Builds the router.
    ///
    /// Every request gets an `x-request-id` (kept if the client sent one),
    /// which is echoed on the response and recorded on the request span.
    /// Panics in handlers are answered with a 500 error envelope.
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/url", post(create_url_handler))
            .route(
                "/url/{alias}",
                get(resolve_url_handler).delete(delete_url_handler),
            )
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .with_state(state)
    }
}

fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
