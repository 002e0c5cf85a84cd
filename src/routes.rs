use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let mut allowed_origins = vec![state.config.frontend_url.parse::<HeaderValue>()?];
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                allowed_origins.push(hv);
            }
        }
    }
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let api_routes = Router::new()
        .route(
            "/api/entries",
            post(handlers::entries::create_entry).get(handlers::entries::list_range),
        )
        .route("/api/entries/recent", get(handlers::entries::list_recent))
        .route("/api/entries/count", get(handlers::entries::count_entries))
        .route("/api/entries/day/:date", get(handlers::entries::list_by_date))
        .route("/api/moods", get(handlers::entries::list_moods));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    Ok(Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
