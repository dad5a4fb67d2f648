// src/report.rs

//! Final report publishing.
//!
//! The runner hands the ordered result list to every configured reporter.
//! A reporter that fails is logged and skipped; it never changes the
//! invocation's exit status.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::time::Duration;

use crate::orchestrator::ExecutionResult;

#[async_trait]
pub trait Reporter: Send + Sync {
    async fn publish(&self, results: &[ExecutionResult]) -> Result<()>;
}

/// Plain-text summary: one line per executable, then the totals.
pub fn summary_text(results: &[ExecutionResult]) -> String {
    let passed = results.iter().filter(|r| r.ok()).count();
    let failed = results.len() - passed;

    let mut out = String::new();
    for r in results {
        let mark = if r.ok() { "PASS" } else { "FAIL" };
        out.push_str(&format!(
            "{} {} ({})\n",
            mark,
            r.executable,
            r.runnable.display()
        ));
    }
    out.push_str(&format!("{} passed, {} failed", passed, failed));
    out
}

#[derive(Debug, Default)]
pub struct ConsoleReporter;

#[async_trait]
impl Reporter for ConsoleReporter {
    async fn publish(&self, results: &[ExecutionResult]) -> Result<()> {
        println!("{}", summary_text(results));
        Ok(())
    }
}

/// Posts `{ "text": ... }` to a Slack-compatible incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    pub url: String,
}

impl WebhookReporter {
    fn payload(&self, results: &[ExecutionResult]) -> serde_json::Value {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        json!({
            "text": format!("UI automation run at {}\n{}", stamp, summary_text(results))
        })
    }
}

#[async_trait]
impl Reporter for WebhookReporter {
    async fn publish(&self, results: &[ExecutionResult]) -> Result<()> {
        let client = reqwest::Client::new();
        let resp = client
            .post(&self.url)
            .json(&self.payload(results))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .context("Failed to call report webhook")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Report webhook failed: {} {}", status, text);
        }

        Ok(())
    }
}

/// Console always; the webhook only when a URL is configured.
pub fn reporters(webhook_url: Option<&str>) -> Vec<Box<dyn Reporter>> {
    let mut out: Vec<Box<dyn Reporter>> = vec![Box::new(ConsoleReporter)];
    if let Some(url) = webhook_url.filter(|u| !u.trim().is_empty()) {
        out.push(Box::new(WebhookReporter {
            url: url.to_string(),
        }));
    }
    out
}

pub async fn publish_all(reporters: &[Box<dyn Reporter>], results: &[ExecutionResult]) {
    for reporter in reporters {
        if let Err(e) = reporter.publish(results).await {
            tracing::warn!(error = %format!("{:#}", e), "failed to publish report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(e: &str, code: i32) -> ExecutionResult {
        ExecutionResult {
            runnable: PathBuf::from("runnables/smoke.json"),
            executable: e.to_string(),
            exit_code: code,
        }
    }

    #[test]
    fn summary_lists_every_result_and_totals() {
        let text = summary_text(&[result("login", 0), result("checkout", 1)]);

        assert_eq!(
            text,
            "PASS login (runnables/smoke.json)\n\
             FAIL checkout (runnables/smoke.json)\n\
             1 passed, 1 failed"
        );
    }

    #[test]
    fn webhook_payload_wraps_summary_in_text() {
        let reporter = WebhookReporter {
            url: "http://localhost/hook".into(),
        };
        let payload = reporter.payload(&[result("login", 0)]);
        let text = payload["text"].as_str().unwrap();

        assert!(text.starts_with("UI automation run at "));
        assert!(text.ends_with("1 passed, 0 failed"));
    }

    #[test]
    fn webhook_is_only_added_when_configured() {
        assert_eq!(reporters(None).len(), 1);
        assert_eq!(reporters(Some("  ")).len(), 1);
        assert_eq!(reporters(Some("https://hooks.example/x")).len(), 2);
    }

    struct Failing;

    #[async_trait]
    impl Reporter for Failing {
        async fn publish(&self, _: &[ExecutionResult]) -> Result<()> {
            bail!("down")
        }
    }

    #[tokio::test]
    async fn reporter_failure_is_not_fatal() {
        let reporters: Vec<Box<dyn Reporter>> = vec![Box::new(Failing), Box::new(ConsoleReporter)];
        publish_all(&reporters, &[result("login", 0)]).await;
    }
}
