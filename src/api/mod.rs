//! REST API layer: route handlers, DTOs, authentication, and router
//! composition.
//!
//! Job and payout endpoints are mounted under `/api/v1` and require the
//! scheduler's bearer secret; `/health` is public.

pub mod auth;
pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;

/// OpenAPI document for all REST endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "payout-reconciler",
        description = "Monthly payout reconciliation job"
    ),
    paths(
        handlers::jobs::run_monthly_payouts,
        handlers::jobs::run_monthly_payments,
        handlers::jobs::preview_monthly_payouts,
        handlers::payouts::list_payouts,
        handlers::system::health_handler,
    ),
    components(schemas(
        dto::PayoutRunResponse,
        dto::EmptyRunResponse,
        dto::PayoutListResponse,
        crate::service::PayoutLine,
        crate::service::PreviewReport,
        crate::domain::AccountEarningsSummary,
        crate::domain::Payout,
        crate::domain::PayoutStatus,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "Jobs", description = "Scheduler-triggered batch jobs"),
        (name = "Payouts", description = "Recorded payouts"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
#[derive(Debug)]
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: routes, middleware, and state.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}
