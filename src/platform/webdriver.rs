// src/platform/webdriver.rs

//! Minimal W3C WebDriver client.
//!
//! Both platforms speak WebDriver over HTTP:
//! - web: chromedriver / geckodriver
//! - mac: Appium with the Mac2 driver
//!
//! Only the endpoints the runner needs are implemented.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

use super::{DriverSession, ElementHandle};

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Open a new session with the given `alwaysMatch` capabilities.
pub async fn new_session(endpoint: &str, capabilities: Value) -> Result<WebDriverSession> {
    let client = reqwest::Client::new();
    let base = endpoint.trim_end_matches('/').to_string();

    let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
    let value = call(&client, Method::POST, &format!("{}/session", base), Some(&body))
        .await
        .with_context(|| format!("Failed to open WebDriver session at {}", base))?;

    let session_id = value
        .get("sessionId")
        .and_then(Value::as_str)
        .context("WebDriver did not return a sessionId")?
        .to_string();

    tracing::debug!(endpoint = %base, session = %session_id, "webdriver session opened");

    Ok(WebDriverSession {
        client,
        base,
        session_id,
    })
}

#[derive(Debug)]
pub struct WebDriverSession {
    client: reqwest::Client,
    base: String,
    session_id: String,
}

impl WebDriverSession {
    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session_id, path)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        call(&self.client, Method::GET, &self.url(path), None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        call(&self.client, Method::POST, &self.url(path), Some(&body)).await
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}{}", element.0, suffix)
    }
}

#[async_trait]
impl DriverSession for WebDriverSession {
    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let value = self.get("/screenshot").await?;
        let encoded = value
            .as_str()
            .context("Screenshot response is not a base64 string")?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .context("Screenshot is not valid base64")
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.post("/url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn title(&mut self) -> Result<String> {
        let v = self.get("/title").await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn current_url(&mut self) -> Result<String> {
        let v = self.get("/url").await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn find(&mut self, using: &str, value: &str) -> Result<Option<ElementHandle>> {
        let res = self
            .post("/element", json!({ "using": using, "value": value }))
            .await;

        match res {
            Ok(v) => {
                let id = v
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .context("Element response has no element reference")?;
                Ok(Some(ElementHandle(id.to_string())))
            }
            Err(e) if is_no_such_element(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.post(&Self::element_path(element, "/click"), json!({}))
            .await?;
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()> {
        self.post(&Self::element_path(element, "/value"), json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn clear(&mut self, element: &ElementHandle) -> Result<()> {
        self.post(&Self::element_path(element, "/clear"), json!({}))
            .await?;
        Ok(())
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String> {
        let v = self.get(&Self::element_path(element, "/text")).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn close(&mut self) -> Result<()> {
        call(&self.client, Method::DELETE, &self.url(""), None).await?;
        tracing::debug!(session = %self.session_id, "webdriver session closed");
        Ok(())
    }
}

/// Error returned by the remote end (`{"value": {"error": .., "message": ..}}`).
#[derive(Debug)]
pub struct WebDriverError {
    pub status: u16,
    pub error: String,
    pub message: String,
}

impl std::fmt::Display for WebDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebDriver {} ({}): {}", self.error, self.status, self.message)
    }
}

impl std::error::Error for WebDriverError {}

fn is_no_such_element(err: &anyhow::Error) -> bool {
    err.downcast_ref::<WebDriverError>()
        .map(|e| e.error == "no such element")
        .unwrap_or(false)
}

async fn call(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value> {
    let mut req = client.request(method.clone(), url).timeout(REQUEST_TIMEOUT);
    if let Some(b) = body {
        req = req.json(b);
    }

    let resp = req
        .send()
        .await
        .with_context(|| format!("WebDriver {} {} failed", method, url))?;

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    let parsed: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("WebDriver returned invalid JSON: {}", text))?
    };

    let value = parsed.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WebDriverError {
            status: status.as_u16(),
            error,
            message,
        }
        .into());
    }

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        // Some legacy drivers report errors with HTTP 200.
        bail!("WebDriver {}: {}", error, value.get("message").unwrap_or(&Value::Null));
    }

    Ok(value)
}
