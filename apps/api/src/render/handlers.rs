//! Render HTTP surface — thin: load rows, delegate to the engine.

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::cv::{CvRow, CvSectionRow};
use crate::models::template::TemplateRow;
use crate::models::user::UserRow;
use crate::render::engine::{render_cv, render_preview};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub deleted: u64,
}

/// GET /api/v1/cvs/:id/render
pub async fn handle_render_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let cv: Option<CvRow> = sqlx::query_as("SELECT * FROM cvs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let cv = cv.ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))?;

    let template_id = cv
        .template_id
        .ok_or_else(|| AppError::Validation(format!("CV {id} has no template assigned")))?;

    let template: Option<TemplateRow> = sqlx::query_as("SELECT * FROM templates WHERE id = $1")
        .bind(template_id)
        .fetch_optional(&state.db)
        .await?;
    let template =
        template.ok_or_else(|| AppError::NotFound(format!("Template {template_id} not found")))?;

    let sections: Vec<CvSectionRow> = sqlx::query_as("SELECT * FROM cv_sections WHERE cv_id = $1")
        .bind(id)
        .fetch_all(&state.db)
        .await?;

    let owner: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(cv.user_id)
        .fetch_optional(&state.db)
        .await?;

    let html = render_cv(
        state.cache.as_ref(),
        state.artifacts.as_ref(),
        &cv,
        &sections,
        owner.as_ref(),
        &template,
    )
    .await?;

    sqlx::query("UPDATE cvs SET last_accessed_at = now() WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(Html(html))
}

/// GET /api/v1/templates/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let template: Option<TemplateRow> = sqlx::query_as("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let template = template.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    let html = render_preview(state.artifacts.as_ref(), &template).await?;
    Ok(Html(html))
}

/// DELETE /api/v1/cvs/:id/cache
pub async fn handle_clear_cache(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClearCacheResponse>, AppError> {
    let deleted = state.cache.invalidate_cv(id).await?;
    Ok(Json(ClearCacheResponse { deleted }))
}
