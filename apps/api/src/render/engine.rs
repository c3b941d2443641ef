//! Render orchestration: validate → cache probe → config merge → model build →
//! Tera execution → cache fill.

use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::cv::{CvRow, CvSectionRow};
use crate::models::template::TemplateRow;
use crate::models::user::UserRow;
use crate::render::cache::{RenderCache, RENDER_TTL};
use crate::render::config_merge::merge;
use crate::render::fingerprint::build_cache_key;
use crate::render::model::{build_render_model, build_section_models, sample_model};
use crate::template::artifacts::ArtifactStore;

/// Renders a CV against its template, serving from the shared cache whenever
/// the content fingerprint matches a previous render.
///
/// The missing-artifact check runs before any cache access; a template that
/// was never compiled is a caller error, not a render failure.
pub async fn render_cv(
    cache: &dyn RenderCache,
    artifacts: &dyn ArtifactStore,
    cv: &CvRow,
    sections: &[CvSectionRow],
    owner: Option<&UserRow>,
    template: &TemplateRow,
) -> Result<String, AppError> {
    let compiled_path = template.compiled_file_path.as_deref().ok_or_else(|| {
        AppError::Validation(format!("Template {} has no compiled artifact", template.id))
    })?;

    let cache_key = build_cache_key(cv, template.id, sections);
    if let Some(cached) = cache.get(&cache_key).await? {
        debug!("Cache HIT for CV {}", cv.id);
        return Ok(cached);
    }
    debug!("Cache MISS for CV {}", cv.id);

    let config = merge(template.template_config.as_ref(), cv.customization.as_ref());
    let section_models = build_section_models(sections);
    let model = build_render_model(cv.cv_data.as_ref(), owner, &section_models, config);

    let html = execute_template(artifacts, compiled_path, &model).await?;

    cache.put(&cache_key, &html, RENDER_TTL).await?;
    Ok(html)
}

/// Renders a template against the fixed sample model — the gallery preview
/// path. No CV involved, nothing cached.
pub async fn render_preview(
    artifacts: &dyn ArtifactStore,
    template: &TemplateRow,
) -> Result<String, AppError> {
    let compiled_path = template.compiled_file_path.as_deref().ok_or_else(|| {
        AppError::Validation(format!("Template {} has no compiled artifact", template.id))
    })?;

    let config = merge(template.template_config.as_ref(), None);
    let model = sample_model(config);

    execute_template(artifacts, compiled_path, &model).await
}

/// Loads the compiled artifact and executes it with Tera. Engine and
/// artifact-read failures surface as one render-failure kind; the cause is
/// logged, never returned to the caller.
async fn execute_template(
    artifacts: &dyn ArtifactStore,
    compiled_path: &str,
    model: &serde_json::Value,
) -> Result<String, AppError> {
    let file_name = base_file_name(compiled_path);
    let source = artifacts.get(file_name).await.map_err(|e| {
        error!("Failed to load compiled template {file_name}: {e}");
        AppError::TemplateRenderFailed(format!("failed to load compiled template {file_name}"))
    })?;

    let template_name = file_name.strip_suffix(".html").unwrap_or(file_name);

    let mut tera = tera::Tera::default();
    tera.add_raw_template(template_name, &source).map_err(|e| {
        AppError::TemplateRenderFailed(format!("invalid compiled template {template_name}: {e}"))
    })?;

    let mut context = tera::Context::new();
    context.insert("cvData", model);

    tera.render(template_name, &context).map_err(|e| {
        AppError::TemplateRenderFailed(format!("execution of {template_name} failed: {e}"))
    })
}

/// Strips any path prefix from the stored artifact reference.
fn base_file_name(compiled_path: &str) -> &str {
    compiled_path.rsplit('/').next().unwrap_or(compiled_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::template::parser::compile;

    struct MemoryArtifactStore {
        files: Mutex<HashMap<String, String>>,
    }

    impl MemoryArtifactStore {
        fn with(file_name: &str, content: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(file_name.to_string(), content.to_string());
            Self {
                files: Mutex::new(files),
            }
        }
    }

    #[async_trait]
    impl ArtifactStore for MemoryArtifactStore {
        async fn put(&self, file_name: &str, content: &str) -> Result<(), AppError> {
            self.files
                .lock()
                .unwrap()
                .insert(file_name.to_string(), content.to_string());
            Ok(())
        }

        async fn get(&self, file_name: &str) -> Result<String, AppError> {
            self.files
                .lock()
                .unwrap()
                .get(file_name)
                .cloned()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("no artifact {file_name}")))
        }

        async fn delete(&self, file_name: &str) -> Result<(), AppError> {
            self.files.lock().unwrap().remove(file_name);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingCache {
        entries: Mutex<HashMap<String, String>>,
        hits: AtomicU32,
        misses: AtomicU32,
        gets: AtomicU32,
    }

    #[async_trait]
    impl RenderCache for CountingCache {
        async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let found = self.entries.lock().unwrap().get(key).cloned();
            match found {
                Some(html) => {
                    self.hits.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(html))
                }
                None => {
                    self.misses.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            }
        }

        async fn put(&self, key: &str, html: &str, _ttl: Duration) -> Result<(), AppError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), html.to_string());
            Ok(())
        }

        async fn invalidate_cv(&self, cv_id: Uuid) -> Result<u64, AppError> {
            let mut entries = self.entries.lock().unwrap();
            let prefix = format!("rendered:cv:{cv_id}:");
            let before = entries.len();
            entries.retain(|k, _| !k.starts_with(&prefix));
            Ok((before - entries.len()) as u64)
        }

        async fn invalidate_all(&self) -> Result<u64, AppError> {
            let mut entries = self.entries.lock().unwrap();
            let count = entries.len() as u64;
            entries.clear();
            Ok(count)
        }
    }

    const FILE_NAME: &str = "template_demo_20250101_000000.html";

    fn template(compiled_file_path: Option<&str>, config: Option<Value>) -> TemplateRow {
        TemplateRow {
            id: Uuid::new_v4(),
            name: "Demo".to_string(),
            category: None,
            style: None,
            thumbnail_url: None,
            template_config: config,
            sections_definition: None,
            base_html: None,
            compiled_file_path: compiled_file_path.map(String::from),
            version: 1,
            is_active: true,
            is_premium: false,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cv(cv_data: Option<Value>, customization: Option<Value>) -> CvRow {
        CvRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            template_id: None,
            cv_data,
            customization,
            section_order: None,
            share_token: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_accessed_at: None,
        }
    }

    fn section(cv_id: Uuid, section_type: &str, data: Value) -> CvSectionRow {
        CvSectionRow {
            id: Uuid::new_v4(),
            cv_id,
            section_type: section_type.to_string(),
            section_data: Some(data),
            order_index: Some(0),
            is_visible: Some(true),
        }
    }

    #[tokio::test]
    async fn test_round_trip_second_call_served_from_cache() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "Hello {{ cvData.user.name }}");
        let cv = cv(Some(json!({"user": {"name": "Ada"}})), None);
        let template = template(Some(FILE_NAME), None);

        let first = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap();
        let second = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap();

        assert_eq!(first, "Hello Ada");
        assert_eq!(first, second);
        assert_eq!(cache.misses.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_compiled_path_fails_before_cache_access() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "x");
        let cv = cv(None, None);
        let template = template(None, None);

        let err = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_compiled_template_is_render_failure() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "{% for %}");
        let cv = cv(None, None);
        let template = template(Some(FILE_NAME), None);

        let err = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TemplateRenderFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_render_failure() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with("other.html", "x");
        let cv = cv(None, None);
        let template = template(Some(FILE_NAME), None);

        let err = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TemplateRenderFailed(_)));
    }

    #[tokio::test]
    async fn test_compiled_admin_template_renders_section_loop() {
        let raw =
            "<ul><!-- {{#each experiences}} --><li>{{title}}</li><!-- {{/each}} --></ul>";
        let compiled = compile(raw).unwrap();

        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, &compiled);
        let cv = cv(None, None);
        let sections = vec![section(
            cv.id,
            "experiences",
            json!([{"title": "Engineer"}, {"title": "Architect"}]),
        )];
        let template = template(Some(FILE_NAME), None);

        let html = render_cv(&cache, &artifacts, &cv, &sections, None, &template)
            .await
            .unwrap();
        assert!(html.contains("<li>Engineer</li>"));
        assert!(html.contains("<li>Architect</li>"));
    }

    #[tokio::test]
    async fn test_customization_overrides_template_config_in_output() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "color: {{ cvData.config.color }}");
        let cv = cv(None, Some(json!({"color": "blue"})));
        let template = template(Some(FILE_NAME), Some(json!({"color": "red", "font": "Inter"})));

        let html = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap();
        assert_eq!(html, "color: blue");
    }

    #[tokio::test]
    async fn test_path_prefix_stripped_when_resolving_artifact() {
        let cache = CountingCache::default();
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "ok");
        let cv = cv(None, None);
        let template = template(Some(&format!("cv/{FILE_NAME}")), None);

        let html = render_cv(&cache, &artifacts, &cv, &[], None, &template)
            .await
            .unwrap();
        assert_eq!(html, "ok");
    }

    #[tokio::test]
    async fn test_preview_renders_sample_data() {
        let artifacts = MemoryArtifactStore::with(
            FILE_NAME,
            "{{ cvData.user.name }}{% for experience in cvData.sections.experiences %} at {{ experience.company }}{% endfor %}",
        );
        let template = template(Some(FILE_NAME), Some(json!({"color": "red"})));

        let html = render_preview(&artifacts, &template).await.unwrap();
        assert!(html.contains("John Doe"));
        assert!(html.contains("at Tech Corp"));
    }

    #[tokio::test]
    async fn test_preview_requires_compiled_artifact() {
        let artifacts = MemoryArtifactStore::with(FILE_NAME, "x");
        let template = template(None, None);

        let err = render_preview(&artifacts, &template).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
