//! Shared CLI plumbing: config loading and the `config validate`/`config
//! show` subcommands. Config resolution follows a `<ENV VAR>` → file →
//! default fallback chain; validation delegates to this crate's single
//! `Config::validate() -> Result<()>` rather than collecting a list of
//! per-issue severities.

pub mod config;
pub mod oneshot;
pub mod run_task;

use std::path::{Path, PathBuf};

use authscope_domain::config::Config;
use authscope_domain::model::{ResolvedDomain, Task, TaskResult};

/// Builds the same "exception" `TaskResult` shape `authscope-worker`'s
/// `process::exception_result` produces for a task that never made it
/// through the pipeline — used here when the analyzer itself returns an
/// infrastructure `Err` rather than a result with `exception` already set.
pub(crate) fn exception_result(task: &Task, message: String) -> TaskResult {
    TaskResult {
        task_id: task.task_config.task_id.clone(),
        scan_id: task.scan_config.scan_id.clone(),
        resolved: ResolvedDomain {
            reachable: false,
            domain: Some(task.domain.clone()),
            url: None,
            error_msg: Some(message.clone()),
        },
        timings: Default::default(),
        login_page_candidates: Vec::new(),
        authentication_mechanisms: Default::default(),
        identity_providers: Vec::new(),
        metadata_available: Default::default(),
        metadata_data: Default::default(),
        exception: Some(message),
    }
}

/// Env var naming a config file path, checked when `--config` is omitted.
pub const CONFIG_ENV: &str = "AUTHSCOPE_CONFIG";

/// Resolves the config file to use (`--config` flag, else `$AUTHSCOPE_CONFIG`,
/// else `config.toml` in the working directory) and loads it, falling back
/// to [`Config::default`] when the resolved path doesn't exist. Returns the
/// loaded config and the path it was read from (or attempted).
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    let path = explicit
        .map(PathBuf::from)
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Ok((Config::default(), path));
    }

    let config = Config::load(&path)?;
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_reads_the_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let (config, used) = load_config(Some(&path)).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn load_config_falls_back_to_defaults_when_path_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.toml");

        let (config, used) = load_config(Some(&path)).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.worker.broker.prefetch, 1);
    }

    #[test]
    fn exception_result_carries_the_message_and_marks_unreachable() {
        let task = Task::new(
            authscope_domain::model::ScanConfig {
                scan_id: "scan-1".into(),
                scan_type: authscope_domain::model::ScanType::Single,
                list_id: None,
                rank: None,
            },
            "example.com",
            authscope_domain::model::AnalyzerKind::LandscapeAnalysis,
            serde_json::json!({}),
        );

        let result = exception_result(&task, "browser launch failed".into());
        assert_eq!(result.task_id, task.task_config.task_id);
        assert_eq!(result.exception.as_deref(), Some("browser launch failed"));
        assert!(!result.resolved.reachable);
    }
}
