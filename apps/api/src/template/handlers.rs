//! Admin template HTTP surface — thin: parse, delegate to the store.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::template::TemplateRow;
use crate::state::AppState;
use crate::template::store::{
    compile_preview, create_from_html, delete_template, toggle_active, update_html,
    TemplateUploadRequest,
};

#[derive(Deserialize)]
pub struct CompileTestRequest {
    pub html: String,
}

#[derive(Serialize)]
pub struct CompileTestResponse {
    pub compiled: String,
}

/// POST /api/v1/admin/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateUploadRequest>,
) -> Result<(StatusCode, Json<TemplateRow>), AppError> {
    let template = create_from_html(&state.db, state.artifacts.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /api/v1/admin/templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TemplateUploadRequest>,
) -> Result<Json<TemplateRow>, AppError> {
    let template = update_html(&state.db, state.artifacts.as_ref(), id, &req).await?;
    // Fingerprints do not cover the template version — drop every cached render.
    state.cache.invalidate_all().await?;
    Ok(Json(template))
}

/// DELETE /api/v1/admin/templates/:id
pub async fn handle_delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_template(&state.db, state.artifacts.as_ref(), id).await?;
    state.cache.invalidate_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/admin/templates/:id/active
pub async fn handle_toggle_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateRow>, AppError> {
    let template = toggle_active(&state.db, id).await?;
    Ok(Json(template))
}

/// POST /api/v1/admin/templates/compile-test
pub async fn handle_compile_test(
    Json(req): Json<CompileTestRequest>,
) -> Result<Json<CompileTestResponse>, AppError> {
    let compiled = compile_preview(&req.html)?;
    Ok(Json(CompileTestResponse { compiled }))
}
