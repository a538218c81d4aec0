//! One-shot per-analyzer subcommands (§6 "CLI surface (worker)"): run a
//! single domain through the full analyzer pipeline outside the broker,
//! writing the resulting `TaskResult` to a file under `--out`.
//!
//! Exit code is 0 for pipeline completion, even when the task itself ends
//! in `exception` — only a configuration problem (bad `--config`, an
//! unwritable `--out`) is a non-zero exit, per the same section.

use std::path::{Path, PathBuf};

use authscope_domain::config::Config;
use authscope_domain::model::{AnalyzerKind, ScanConfig, ScanType, Task};

use super::exception_result;

pub async fn run(analyzer: AnalyzerKind, domain: &str, config: &Config, out: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out)?;

    let scan_config = ScanConfig {
        scan_id: uuid::Uuid::new_v4().to_string(),
        scan_type: ScanType::Single,
        list_id: None,
        rank: None,
    };
    let task = Task::new(scan_config, domain, analyzer, serde_json::json!({}));
    let task_id = task.task_config.task_id.clone();

    let ruleset = authscope_idp::ruleset::load(None)?;
    let client = reqwest::Client::new();

    // An `Err` here is an infrastructure failure inside the pipeline, not a
    // configuration problem — it still gets a result file and a 0 exit, the
    // same as the worker's child-process supervisor does for a crashed task.
    let result = match authscope_analyzer::run(&task, config, &ruleset, &client).await {
        Ok(result) => result,
        Err(e) => exception_result(&task, e.to_string()),
    };

    let out_file: PathBuf = out.join(format!("{}-{task_id}.json", analyzer.queue_name()));
    let body = serde_json::to_string_pretty(&result)?;
    std::fs::write(&out_file, body)?;

    if let Some(exception) = &result.exception {
        tracing::warn!(task_id, %exception, "task completed with an exception");
    }
    println!("{}", out_file.display());
    Ok(())
}
