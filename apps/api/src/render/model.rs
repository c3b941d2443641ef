//! Render data model construction.
//!
//! Everything a template can reach lives under one context root, `cvData`:
//! the CV's `cv_data` blob overlaid with `user`, `config`, a by-name
//! `sections` map (what compiled `cvData.sections.NAME` loops iterate) and
//! the ordered `sectionList`.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::cv::CvSectionRow;
use crate::models::user::UserRow;

/// One section as exposed to templates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionModel {
    pub section_type: String,
    pub is_visible: bool,
    pub section_data: Value,
}

/// Filters to visible sections and sorts ascending by `order_index` with
/// NULLs last. Section payloads pass through as-is; absent data becomes an
/// empty list.
pub fn build_section_models(sections: &[CvSectionRow]) -> Vec<SectionModel> {
    let mut visible: Vec<&CvSectionRow> = sections
        .iter()
        .filter(|s| s.is_visible.unwrap_or(false))
        .collect();
    visible.sort_by_key(|s| s.order_index.map_or(i64::MAX, i64::from));

    visible
        .into_iter()
        .map(|s| SectionModel {
            section_type: s.section_type.clone(),
            is_visible: true,
            section_data: s.section_data.clone().unwrap_or_else(|| json!([])),
        })
        .collect()
}

/// The `user` object for the model: prefer one embedded in `cv_data`, else a
/// minimal map derived from the owning user row (`avatar` empty when absent).
pub fn build_user_model(cv_data: Option<&Value>, owner: Option<&UserRow>) -> Option<Value> {
    if let Some(user) = cv_data.and_then(|d| d.get("user")) {
        if user.is_object() {
            return Some(user.clone());
        }
    }

    owner.map(|u| {
        json!({
            "firstName": u.first_name.clone().unwrap_or_default(),
            "lastName": u.last_name.clone().unwrap_or_default(),
            "email": u.email,
            "avatar": u.avatar.clone().unwrap_or_default(),
        })
    })
}

/// Assembles the `cvData` root bound into the template context.
pub fn build_render_model(
    cv_data: Option<&Value>,
    owner: Option<&UserRow>,
    section_models: &[SectionModel],
    config: Value,
) -> Value {
    let mut root = match cv_data {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    if let Some(user) = build_user_model(cv_data, owner) {
        root.insert("user".to_string(), user);
    }

    let mut by_name = Map::new();
    for section in section_models {
        by_name.insert(section.section_type.clone(), section.section_data.clone());
    }
    root.insert("sections".to_string(), Value::Object(by_name));
    root.insert(
        "sectionList".to_string(),
        serde_json::to_value(section_models).unwrap_or_else(|_| json!([])),
    );
    root.insert("config".to_string(), config);

    Value::Object(root)
}

/// Fixed sample model for template previews — one synthetic user, one
/// experience, one education entry, a skills list. No real user data.
pub fn sample_model(config: Value) -> Value {
    let experiences = json!([{
        "position": "Senior Software Engineer",
        "title": "Senior Software Engineer",
        "company": "Tech Corp",
        "duration": "2020 - Present",
        "description": "Led development of microservices architecture."
    }]);
    let education = json!([{
        "degree": "Bachelor of Computer Science",
        "school": "University of Technology",
        "year": "2015 - 2019"
    }]);
    let skills = json!(["Rust", "PostgreSQL", "Redis", "Docker", "React"]);

    json!({
        "user": {
            "name": "John Doe",
            "firstName": "John",
            "lastName": "Doe",
            "title": "Senior Software Engineer",
            "email": "john.doe@example.com",
            "phone": "+1 234 567 8900",
            "location": "San Francisco, CA",
            "linkedin": "linkedin.com/in/johndoe",
            "github": "github.com/johndoe",
            "avatar": ""
        },
        "summary": "Experienced software engineer with 5+ years in full-stack development.",
        "sections": {
            "experiences": experiences,
            "education": education,
            "skills": skills
        },
        "sectionList": [
            {"sectionType": "experiences", "isVisible": true, "sectionData": experiences},
            {"sectionType": "education", "isVisible": true, "sectionData": education},
            {"sectionType": "skills", "isVisible": true, "sectionData": skills}
        ],
        "config": config
    })
}
