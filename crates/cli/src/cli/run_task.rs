//! The hidden `run-task` subcommand: the child process `authscope-worker`'s
//! `process::run_in_child` spawns for every task, isolating the
//! browser-automation stack from the consume loop. Reads a `ChildRequest`
//! JSON document from stdin, runs the analyzer, and writes the resulting
//! `TaskResult` JSON to stdout.
//!
//! Mirrors `authscope_worker::process::ChildRequest` field-for-field (that
//! struct is private to the worker crate, since only this binary's own
//! `current_exe()` re-invocation produces it) and `process::exception_result`
//! for the same-shape fallback when the analyzer returns an infrastructure
//! error rather than a task result.

use std::io::Read;

use serde::Deserialize;

use authscope_domain::config::Config;
use authscope_domain::model::Task;

use super::exception_result;

#[derive(Deserialize)]
struct ChildRequest {
    task: Task,
    config: Config,
}

/// Reads the request from stdin, runs it, and writes the `TaskResult` to
/// stdout. Always exits 0 when a result (even an exception result) was
/// produced; a malformed request on stdin is the one case treated as a
/// configuration error.
pub async fn run() -> anyhow::Result<()> {
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let request: ChildRequest = serde_json::from_str(&raw)?;

    let ruleset = authscope_idp::ruleset::load(None)?;
    let client = reqwest::Client::new();

    let result = match authscope_analyzer::run(&request.task, &request.config, &ruleset, &client).await {
        Ok(result) => result,
        Err(e) => exception_result(&request.task, e.to_string()),
    };

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
