use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.security.cors_origins);

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(branch_routes())
        .merge(user_routes());

    // Global middleware
    if state.request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.layer(ServiceBuilder::new().layer(cors)).with_state(state)
}

fn branch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/branches",
            get(handlers::branch_list).post(handlers::branch_create),
        )
        .route("/users/:user_id/branches/private", get(handlers::branch_list_private))
        .route("/branches/:branch_id", get(handlers::branch_show))
        .route("/branches/:branch_id/sharing", post(handlers::branch_share))
}

fn user_routes() -> Router<AppState> {
    Router::new().route("/current-user", get(handlers::current_user))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}
