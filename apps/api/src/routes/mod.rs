pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::render::handlers as render_handlers;
use crate::state::AppState;
use crate::template::handlers as template_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Admin template API
        .route(
            "/api/v1/admin/templates",
            post(template_handlers::handle_create_template),
        )
        .route(
            "/api/v1/admin/templates/:id",
            put(template_handlers::handle_update_template)
                .delete(template_handlers::handle_delete_template),
        )
        .route(
            "/api/v1/admin/templates/:id/active",
            patch(template_handlers::handle_toggle_active),
        )
        .route(
            "/api/v1/admin/templates/compile-test",
            post(template_handlers::handle_compile_test),
        )
        // Render API
        .route(
            "/api/v1/templates/:id/preview",
            get(render_handlers::handle_preview),
        )
        .route(
            "/api/v1/cvs/:id/render",
            get(render_handlers::handle_render_cv),
        )
        .route(
            "/api/v1/cvs/:id/cache",
            delete(render_handlers::handle_clear_cache),
        )
        .with_state(state)
}
