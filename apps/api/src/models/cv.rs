use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A user's CV instance, bound to at most one template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: Option<Uuid>,
    /// Merged rendering input; may embed the user object and section payloads.
    pub cv_data: Option<Value>,
    /// Per-CV override of the template's config.
    pub customization: Option<Value>,
    /// Persisted but unused by the render path — the authoritative order
    /// comes from `CvSectionRow.order_index`.
    pub section_order: Option<Value>,
    pub share_token: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// One named, ordered, independently hideable block of CV content.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvSectionRow {
    pub id: Uuid,
    pub cv_id: Uuid,
    /// Tag such as "experiences" or "education".
    pub section_type: String,
    /// Array or object payload for the section.
    pub section_data: Option<Value>,
    /// Render/display order. Not guaranteed unique or contiguous.
    pub order_index: Option<i32>,
    /// false or NULL excludes the section from rendering.
    pub is_visible: Option<bool>,
}
