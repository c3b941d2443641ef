//! Template compiler/store — orchestrates clean → compile → artifact upload →
//! database row, and the update/delete lifecycle around it.
//!
//! Artifact writes are deliberately not transactional with the row: the
//! artifact is written before the row commits, and rows are deleted before
//! their artifact, so crash windows produce orphaned files (reconcilable)
//! rather than rows pointing at missing artifacts. A crash between the
//! update's file write and row commit can still leave the row referencing a
//! stale artifact; there is no automatic recovery.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::template::TemplateRow;
use crate::template::artifacts::ArtifactStore;
use crate::template::parser::{compile, extract_sections_definition};
use crate::template::sanitizer::clean;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Admin upload payload: raw HTML plus template metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateUploadRequest {
    pub name: String,
    pub base_html: String,
    pub category: Option<String>,
    pub style: Option<String>,
    pub thumbnail_url: Option<String>,
    pub template_config: Option<Value>,
    pub sections_definition: Option<Value>,
    pub is_premium: Option<bool>,
    pub created_by: Option<String>,
}

/// Creates a template from admin HTML: clean → compile → upload artifact →
/// insert row with `version = 1`, `is_active = true`.
///
/// Artifact upload failure aborts the operation — no row is written.
pub async fn create_from_html(
    db: &PgPool,
    artifacts: &dyn ArtifactStore,
    req: &TemplateUploadRequest,
) -> Result<TemplateRow, AppError> {
    info!("Creating template from HTML: {}", req.name);

    let cleaned = clean(&req.base_html)?;
    let compiled = compile(&cleaned)?;

    let file_name = generate_file_name(&req.name);
    artifacts.put(&file_name, &compiled).await?;

    let sections_definition = req
        .sections_definition
        .clone()
        .unwrap_or_else(|| extract_sections_definition(&cleaned));

    let template: TemplateRow = sqlx::query_as(
        r#"
        INSERT INTO templates
            (id, name, category, style, thumbnail_url, template_config,
             sections_definition, base_html, compiled_file_path, version,
             is_active, is_premium, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 1, TRUE, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.name)
    .bind(&req.category)
    .bind(&req.style)
    .bind(&req.thumbnail_url)
    .bind(&req.template_config)
    .bind(&sections_definition)
    .bind(&cleaned)
    .bind(&file_name)
    .bind(req.is_premium.unwrap_or(false))
    .bind(&req.created_by)
    .fetch_one(db)
    .await?;

    info!("Template created with ID {}", template.id);
    Ok(template)
}

/// Re-cleans and re-compiles a template's HTML, replacing the stored artifact
/// and bumping `version`. The previous artifact is deleted best-effort; the
/// new one always gets a fresh file name.
pub async fn update_html(
    db: &PgPool,
    artifacts: &dyn ArtifactStore,
    id: Uuid,
    req: &TemplateUploadRequest,
) -> Result<TemplateRow, AppError> {
    info!("Updating template HTML: {id}");

    let existing: Option<TemplateRow> = sqlx::query_as("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    let cleaned = clean(&req.base_html)?;
    let compiled = compile(&cleaned)?;

    if let Some(old) = &existing.compiled_file_path {
        if let Err(e) = artifacts.delete(old).await {
            warn!("Failed to delete old template artifact {old}: {e}");
        }
    }

    let file_name = generate_file_name(&req.name);
    artifacts.put(&file_name, &compiled).await?;

    let sections_definition = req
        .sections_definition
        .clone()
        .unwrap_or_else(|| extract_sections_definition(&cleaned));

    let template: TemplateRow = sqlx::query_as(
        r#"
        UPDATE templates
        SET name = $1, category = $2, style = $3, thumbnail_url = $4,
            template_config = $5, sections_definition = $6, base_html = $7,
            compiled_file_path = $8, is_premium = $9,
            version = version + 1, updated_at = now()
        WHERE id = $10
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.category)
    .bind(&req.style)
    .bind(&req.thumbnail_url)
    .bind(&req.template_config)
    .bind(&sections_definition)
    .bind(&cleaned)
    .bind(&file_name)
    .bind(req.is_premium.unwrap_or(existing.is_premium))
    .bind(id)
    .fetch_one(db)
    .await?;

    info!("Template {} updated to version {}", template.id, template.version);
    Ok(template)
}

/// Deletes a template. The row goes first; the artifact delete is best-effort
/// so a failure leaves an orphaned file, never a dangling reference.
pub async fn delete_template(
    db: &PgPool,
    artifacts: &dyn ArtifactStore,
    id: Uuid,
) -> Result<(), AppError> {
    let existing: Option<TemplateRow> = sqlx::query_as("SELECT * FROM templates WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    let existing = existing.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    sqlx::query("DELETE FROM templates WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if let Some(file) = &existing.compiled_file_path {
        if let Err(e) = artifacts.delete(file).await {
            warn!("Failed to delete template artifact {file}: {e}");
        }
    }

    info!("Template deleted: {id}");
    Ok(())
}

/// Flips a template's active flag.
pub async fn toggle_active(db: &PgPool, id: Uuid) -> Result<TemplateRow, AppError> {
    let template: Option<TemplateRow> = sqlx::query_as(
        "UPDATE templates SET is_active = NOT is_active, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    let template = template.ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    info!(
        "Template {} active status changed to {}",
        template.id, template.is_active
    );
    Ok(template)
}

/// Cleans and compiles HTML without persisting anything — the admin
/// "test compile" path.
pub fn compile_preview(html: &str) -> Result<String, AppError> {
    let cleaned = clean(html)?;
    compile(&cleaned)
}

/// Generates the artifact file name: `template_{slug}_{yyyyMMdd_HHmmss}.html`.
///
/// Second-precision timestamps mean two same-named templates created within
/// the same second collide; last write wins in the artifact store. Tolerated —
/// the name format is load-bearing for compatibility.
pub fn generate_file_name(template_name: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("template_{}_{}.html", slugify(template_name), timestamp)
}

/// Lowercases and collapses every run of non-alphanumerics to `_`.
fn slugify(name: &str) -> String {
    SLUG_RE.replace_all(&name.to_lowercase(), "_").into_owned()
}
