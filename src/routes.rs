use std::time::Duration;

use axum::{Router, error_handling::HandleErrorLayer, extract::DefaultBodyLimit, routing::get};
use axum_tracing_opentelemetry::middleware::{OtelAxumLayer, OtelInResponseLayer};
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::{
    config::Config,
    handlers::{create_user, delete_user, get_user, get_users, update_user},
    response::{middleware_error_response, panic_response},
    state::AppState,
};

pub fn create_router(state: AppState, config: &Config) -> Router {
    let users = Router::new()
        .route("/users", get(get_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        );

    // Request bodies are unbounded, only their JSON shape is checked.
    let router = Router::new()
        .nest("/api", users)
        .layer(DefaultBodyLimit::disable())
        .with_state(state);
    with_middleware(router, config.request_timeout)
}

/// Request id, request span, panic recovery and timeout, outermost first.
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(OtelInResponseLayer::default())
            .layer(OtelAxumLayer::default())
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(HandleErrorLayer::new(middleware_error_response))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}
