//! HTML cleaning for untrusted, admin-supplied template markup.
//!
//! Structural pass over the parsed document: `<script>` elements are dropped
//! with their content, inline `onclick`/`onload`/`onerror` handlers are
//! stripped from every element. HTML comments survive untouched — the
//! placeholder block markers live in comments and must reach the parser.
//!
//! This is not full XSS sanitization: style/CSS content and URL schemes pass
//! through. Known gap.

use lol_html::{element, rewrite_str, RewriteStrSettings};

use crate::errors::AppError;

const STRIPPED_ATTRIBUTES: [&str; 3] = ["onclick", "onload", "onerror"];

/// Removes scripts and inline event handlers from raw template HTML.
pub fn clean(raw_html: &str) -> Result<String, AppError> {
    rewrite_str(
        raw_html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("*", |el| {
                    for attr in STRIPPED_ATTRIBUTES {
                        el.remove_attribute(attr);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| AppError::Validation(format!("failed to sanitize template HTML: {e}")))
}
