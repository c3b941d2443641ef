//! Placeholder → Tera rewriting.
//!
//! Admin templates carry three marker forms:
//! - `{{expr}}` — interpolation
//! - `<!-- {{#each NAME}} --> body <!-- {{/each}} -->` — iteration
//! - `<!-- {{#if COND}} --> body <!-- {{/if}} -->` — conditional visibility
//!
//! The block markers are HTML comments because `{%`-style directives are not
//! valid markup and a DOM parser would mangle them; rewriting therefore runs
//! on the serialized string, not the DOM. Pass order is fixed: loops, then
//! conditionals, then simple interpolations. Running the simple pass first
//! would swallow the interior of loop/conditional bodies.
//!
//! Nesting: `{{#if}}` inside `{{#each}}` is rewritten against the `cvData`
//! root by the conditional pass; `{{#each}}` inside `{{#if}}` resolves the
//! same way because the loop pass runs first. Loops inside loops are not
//! supported — the inner markers pass through as literal text, as does any
//! unclosed block.

use std::collections::HashSet;
use std::sync::LazyLock;

use lol_html::{element, rewrite_str, RewriteStrSettings};
use regex::{Captures, Regex};
use serde_json::{json, Value};

use crate::errors::AppError;

static LOOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*\{\{#each\s+(\w+)\}\}\s*-->(.*?)<!--\s*\{\{/each\}\}\s*-->")
        .expect("loop pattern is valid")
});

static IF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\s*\{\{#if\s+([^}]+?)\}\}\s*-->(.*?)<!--\s*\{\{/if\}\}\s*-->")
        .expect("conditional pattern is valid")
});

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("marker pattern is valid"));

/// Compiles admin HTML into a Tera template source. Pure string transform.
pub fn compile(raw_html: &str) -> Result<String, AppError> {
    let html = mark_root_element(raw_html)?;

    let mut aliases = HashSet::new();
    let html = rewrite_loops(&html, &mut aliases);
    let html = rewrite_conditionals(&html);
    let html = rewrite_interpolations(&html, &aliases);

    Ok(html)
}

/// Runs the input through a tolerant HTML rewriter and tags the root element
/// with an advisory engine marker. Serialization is byte-faithful elsewhere —
/// no pretty-printing, comments preserved.
fn mark_root_element(html: &str) -> Result<String, AppError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("html", |el| {
                el.set_attribute("data-template-engine", "tera")?;
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| AppError::Validation(format!("failed to parse template HTML: {e}")))
}

/// Rewrites comment-delimited `{{#each NAME}}` blocks into `{% for %}` loops
/// over `cvData.sections.NAME`. Simple markers inside the body are qualified
/// with the loop item alias so the body interpolates fields of the iterated
/// item; interior block markers (`#`/`/`) are left for the next pass.
fn rewrite_loops(html: &str, aliases: &mut HashSet<String>) -> String {
    let mut collected = Vec::new();
    let rewritten = LOOP_RE
        .replace_all(html, |caps: &Captures| {
            let name = &caps[1];
            let alias = singular_alias(name);
            let body = qualify_markers(&caps[2], &alias);
            collected.push(alias.clone());
            format!("<div>{{% for {alias} in cvData.sections.{name} %}}{body}{{% endfor %}}</div>")
        })
        .into_owned();
    aliases.extend(collected);
    rewritten
}

/// Rewrites comment-delimited `{{#if COND}}` blocks into `{% if %}` wrappers
/// over `cvData.COND` (boolean truthiness).
fn rewrite_conditionals(html: &str) -> String {
    IF_RE
        .replace_all(html, |caps: &Captures| {
            let cond = caps[1].trim().to_string();
            let body = &caps[2];
            format!("<div>{{% if cvData.{cond} %}}{body}{{% endif %}}</div>")
        })
        .into_owned()
}

/// Rewrites every remaining simple marker to an interpolation over `cvData`.
/// Markers already rooted at `cvData` or at a loop item alias pass through,
/// as do block markers (`#`/`/` — unmatched block halves stay literal text).
fn rewrite_interpolations(html: &str, aliases: &HashSet<String>) -> String {
    MARKER_RE
        .replace_all(html, |caps: &Captures| {
            let expr = caps[1].trim().to_string();
            let root = expr.split('.').next().unwrap_or_default();
            if expr.starts_with('#') || expr.starts_with('/') {
                caps[0].to_string()
            } else if root == "cvData" || aliases.contains(root) {
                format!("{{{{ {expr} }}}}")
            } else {
                format!("{{{{ cvData.{expr} }}}}")
            }
        })
        .into_owned()
}

/// Qualifies simple markers inside a loop body with the item alias.
fn qualify_markers(body: &str, alias: &str) -> String {
    MARKER_RE
        .replace_all(body, |caps: &Captures| {
            let expr = caps[1].trim().to_string();
            if expr.starts_with('#') || expr.starts_with('/') {
                caps[0].to_string()
            } else if expr.starts_with("cvData.") {
                format!("{{{{ {expr} }}}}")
            } else {
                format!("{{{{ {alias}.{expr} }}}}")
            }
        })
        .into_owned()
}

/// Derives the loop item alias: strip a trailing "s" (`experiences` →
/// `experience`), or append "Item" when there is none (`education` →
/// `educationItem`).
fn singular_alias(name: &str) -> String {
    match name.strip_suffix('s') {
        Some(stripped) => stripped.to_string(),
        None => format!("{name}Item"),
    }
}

/// Extracts the sections definition advertised by the template markup via a
/// `data-sections` attribute, falling back to the default section list.
pub fn extract_sections_definition(html: &str) -> Value {
    let mut found: Option<String> = None;
    let _ = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("[data-sections]", |el| {
                if found.is_none() {
                    found = el.get_attribute("data-sections");
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    found
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_else(default_sections_definition)
}

fn default_sections_definition() -> Value {
    json!(["header", "summary", "experiences", "education", "skills", "projects"])
}
