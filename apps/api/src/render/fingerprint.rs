//! Render cache key derivation.

use uuid::Uuid;

use crate::models::cv::{CvRow, CvSectionRow};

/// Builds the cache key `rendered:cv:{cv_id}:{md5hex(fingerprint)}`.
///
/// The fingerprint concatenates the CV id, template id, stringified `cv_data`
/// and `customization`, then each visible section's type + stringified data
/// in slice order (not sorted). Any change to a render input changes the key.
/// The template version is deliberately absent — template updates invalidate
/// the whole rendered keyspace instead.
pub fn build_cache_key(cv: &CvRow, template_id: Uuid, sections: &[CvSectionRow]) -> String {
    let mut data = String::new();
    data.push_str(&cv.id.to_string());
    data.push_str(&template_id.to_string());

    if let Some(cv_data) = &cv.cv_data {
        data.push_str(&cv_data.to_string());
    }
    if let Some(customization) = &cv.customization {
        data.push_str(&customization.to_string());
    }
    for section in sections.iter().filter(|s| s.is_visible.unwrap_or(false)) {
        data.push_str(&section.section_type);
        if let Some(section_data) = &section.section_data {
            data.push_str(&section_data.to_string());
        }
    }

    format!("rendered:cv:{}:{:x}", cv.id, md5::compute(data.as_bytes()))
}
