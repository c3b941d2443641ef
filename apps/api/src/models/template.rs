use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// An admin-authored CV template.
///
/// `compiled_file_path` references the Tera artifact in the artifact store and
/// is non-null whenever the template is usable for rendering. `version` is
/// monotonic — incremented on every HTML update, never reset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub style: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Default colors/fonts/layout, overridable per CV.
    pub template_config: Option<Value>,
    /// Ordered list of section identifiers this template supports.
    pub sections_definition: Option<Value>,
    /// Cleaned original HTML as uploaded by the admin.
    pub base_html: Option<String>,
    /// Relative file name of the compiled Tera artifact.
    pub compiled_file_path: Option<String>,
    pub version: i32,
    pub is_active: bool,
    pub is_premium: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
