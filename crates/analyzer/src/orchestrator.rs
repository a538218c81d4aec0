//! The analyzer orchestrator (C7): runs one task's five stages in the
//! declared order and assembles the `TaskResult`, instrumenting every stage
//! with a `TraceEvent::StageCompleted` and its own `*_duration_seconds`.

use std::collections::HashMap;
use std::time::Instant;

use authscope_browser::{BrowserDriver, ChromiumDriver};
use authscope_domain::config::Config;
use authscope_domain::error::Result;
use authscope_domain::model::{
    AuthenticationMechanisms, IdpRuleset, LoginPageCandidate, Task, TaskResult, Timings,
};
use authscope_domain::trace::TraceEvent;

use crate::{auth_analysis, idp_scan, metadata, resolve};

pub async fn run(task: &Task, cfg: &Config, ruleset: &IdpRuleset, client: &reqwest::Client) -> Result<TaskResult> {
    let task_id = task.task_config.task_id.clone();
    let total_start = Instant::now();
    let mut stage_seconds: HashMap<String, f64> = HashMap::new();

    // Stage 1: resolve.
    let stage_start = Instant::now();
    let resolved = resolve::resolve(client, &task.domain).await;
    record_stage(&task_id, "resolve", stage_start, &mut stage_seconds);

    let mut login_page_candidates: Vec<LoginPageCandidate> = Vec::new();
    let mut authentication_mechanisms = AuthenticationMechanisms::default();
    let mut identity_providers = Vec::new();
    let mut metadata_data = HashMap::new();
    let mut metadata_available = HashMap::new();

    if resolved.reachable {
        let resolved_url = resolved.url.clone().unwrap_or_else(|| format!("https://{}", task.domain));
        let driver = ChromiumDriver::new();
        let shared_ctx = driver.open(&cfg.browser).await.ok();

        // Stage 2: login-page detection.
        let stage_start = Instant::now();
        let generation = authscope_candidates::generate(&resolved_url, &cfg.login_page, client, shared_ctx.as_ref()).await?;
        login_page_candidates = generation.candidates;
        if let Some(sitemap) = generation.sitemap {
            metadata_data.insert("sitemap".to_string(), serde_json::json!(sitemap));
        }
        if let Some(robots) = generation.robots {
            metadata_data.insert("robots".to_string(), serde_json::Value::String(robots));
        }
        record_stage(&task_id, "login_page", stage_start, &mut stage_seconds);

        // Stage 3: authentication analysis, per candidate, on the shared context.
        let stage_start = Instant::now();
        if let Some(ctx) = &shared_ctx {
            for candidate in &mut login_page_candidates {
                match auth_analysis::analyze_candidate(&driver, ctx, cfg, candidate).await {
                    Ok(analysis) => {
                        candidate.resolved = Some(analysis.resolved);
                        if let Some(p) = analysis.password {
                            authentication_mechanisms.password.push(p);
                        }
                        if let Some(m) = analysis.mfa {
                            authentication_mechanisms.mfa.push(m);
                        }
                        if let Some(pk) = analysis.passkey {
                            authentication_mechanisms.passkey.push(pk);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(task_id = %task_id, url = %candidate.url, error = %e, "authentication analysis failed for candidate");
                    }
                }
            }
        }
        record_stage(&task_id, "authentication", stage_start, &mut stage_seconds);

        // Stage 4: IdP detection, fresh context per candidate x idp. The idp
        // scope per candidate shrinks as detections accumulate, per
        // `cfg.recognition.recognition_mode`.
        let stage_start = Instant::now();
        let reachable_urls = login_page_candidates
            .iter()
            .filter(|c| c.resolved.as_ref().is_some_and(|r| r.reachable))
            .map(|c| c.url.clone());
        let mut recognition_scope = idp_scan::RecognitionScope::seed(reachable_urls, &cfg.idp.idp_scope);
        for candidate in &login_page_candidates {
            let reachable = candidate.resolved.as_ref().is_some_and(|r| r.reachable);
            if !reachable {
                continue;
            }
            let idp_scope = recognition_scope.narrow_for(
                &candidate.url,
                &identity_providers,
                cfg.recognition.recognition_mode,
            );
            if idp_scope.is_empty() {
                continue;
            }
            match idp_scan::scan_candidate(cfg, ruleset, &idp_scope, candidate).await {
                Ok(mut found) => identity_providers.append(&mut found),
                Err(e) => tracing::warn!(task_id = %task_id, url = %candidate.url, error = %e, "idp detection failed for candidate"),
            }
        }
        record_stage(&task_id, "idp", stage_start, &mut stage_seconds);

        if let Some(ctx) = shared_ctx {
            let _ = ctx.close().await;
        }

        // Stage 5: metadata.
        let stage_start = Instant::now();
        let origin = format!("https://{}", resolved.domain.clone().unwrap_or_else(|| task.domain.clone()));
        let fetched = metadata::fetch_all(client, &origin, &cfg.metadata).await;
        metadata_data.extend(fetched.metadata_data);
        metadata_available.extend(fetched.metadata_available);
        record_stage(&task_id, "metadata", stage_start, &mut stage_seconds);
    }

    let total_duration_seconds = total_start.elapsed().as_secs_f64();
    TraceEvent::StageCompleted { task_id: task_id.clone(), stage: "total".into(), duration_seconds: total_duration_seconds }.emit();

    Ok(TaskResult {
        task_id,
        scan_id: task.scan_config.scan_id.clone(),
        resolved,
        timings: Timings { stage_seconds, total_duration_seconds },
        login_page_candidates,
        authentication_mechanisms,
        identity_providers,
        metadata_available,
        metadata_data,
        exception: None,
    })
}

fn record_stage(task_id: &str, stage: &str, start: Instant, out: &mut HashMap<String, f64>) {
    let seconds = start.elapsed().as_secs_f64();
    out.insert(format!("{stage}_duration_seconds"), seconds);
    TraceEvent::StageCompleted { task_id: task_id.to_string(), stage: stage.to_string(), duration_seconds: seconds }.emit();
}
