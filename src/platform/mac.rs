// src/platform/mac.rs

//! macOS desktop platform (`"platform": "mac"`), driven through Appium Mac2.
//!
//! `open` names the bundle id of the application under test,
//! e.g. `com.apple.calculator`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::webdriver::new_session;
use super::{locate, xpath_literal, DriverSession, Located, PlatformDriver, Strategy};
use crate::config::PlatformEndpoint;
use crate::program::{expand_placeholders, Command, Program};
use crate::suite::{Arguments, PlatformKind};

pub const MAC_STRATEGIES: &[Strategy] = &[
    Strategy {
        mode: "accessibility-id",
        using: "accessibility id",
        build: by_accessibility_id,
    },
    Strategy {
        mode: "predicate",
        using: "-ios predicate string",
        build: by_predicate,
    },
    Strategy {
        mode: "xpath",
        using: "xpath",
        build: by_xpath,
    },
];

fn by_accessibility_id(t: &str) -> Option<String> {
    Some(t.to_string())
}

fn by_predicate(t: &str) -> Option<String> {
    let quoted = format!("\"{}\"", t.replace('\\', "\\\\").replace('"', "\\\""));
    Some(format!(
        "title == {q} OR label == {q} OR value == {q}",
        q = quoted
    ))
}

fn by_xpath(t: &str) -> Option<String> {
    if t.starts_with('/') {
        return Some(t.to_string());
    }
    let lit = xpath_literal(t);
    Some(format!("//*[@title={lit} or @label={lit}]"))
}

pub struct MacPlatform {
    endpoint: PlatformEndpoint,
}

impl MacPlatform {
    pub fn new(endpoint: PlatformEndpoint) -> Self {
        Self { endpoint }
    }

    fn capabilities(&self) -> Value {
        let mut caps = json!({
            "platformName": "mac",
            "appium:automationName": "Mac2",
        });
        if let Some(obj) = caps.as_object_mut() {
            for (k, v) in &self.endpoint.capabilities {
                obj.insert(k.clone(), v.clone());
            }
        }
        caps
    }
}

#[async_trait]
impl PlatformDriver for MacPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Mac
    }

    async fn init_driver(&self) -> Result<Box<dyn DriverSession>> {
        let session = new_session(&self.endpoint.endpoint, self.capabilities()).await?;
        Ok(Box::new(session))
    }

    /// Launch (or focus) the application named by `open`.
    async fn init_app(
        &self,
        session: &mut dyn DriverSession,
        program: &Program,
        arguments: &Arguments,
    ) -> Result<()> {
        let open = program.open.as_deref().context("Program Error! Open not specified!")?;
        let bundle_id = expand_placeholders(open, arguments);

        tracing::info!(bundle_id = %bundle_id, "activating application");
        session
            .execute_script("macos: activateApp", vec![json!({ "bundleId": bundle_id })])
            .await
            .with_context(|| format!("Failed to activate {}", bundle_id))?;
        Ok(())
    }

    async fn find_element(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<Located> {
        locate(session, MAC_STRATEGIES, command).await
    }
}
