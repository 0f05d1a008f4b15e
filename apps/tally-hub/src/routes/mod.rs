pub mod display;
pub mod health;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(display::router())
        .merge(crate::hub::server::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Display producers
        display::clear,
        display::new_record,
        display::add_line,
        display::remove_line,
        display::charge,
        display::add_label,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Payloads
            crate::hub::EventKind,
            crate::models::LineItem,
            crate::models::Charge,
            crate::models::Record,
            crate::models::Label,
            health::HealthResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Display", description = "Events broadcast to connected displays"),
    )
)]
pub struct ApiDoc;
