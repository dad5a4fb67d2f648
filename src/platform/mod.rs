// src/platform/mod.rs

//! Platform drivers.
//!
//! A platform knows how to open a session, bring the application under test
//! to its starting point, and turn a command's textual target into an
//! on-screen element.
//!
//! Element lookup tries an ordered table of locator strategies. The name of
//! the strategy that matched is the command's resolution `mode`; it is
//! persisted in the lock so a replay tries that one strategy only.

pub mod mac;
pub mod web;
pub mod webdriver;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Platforms;
use crate::program::{Command, Program};
use crate::suite::{Arguments, PlatformKind};

/// Opaque handle to a located element (WebDriver element reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// Result of a successful element lookup.
#[derive(Debug, Clone)]
pub struct Located {
    pub element: ElementHandle,

    /// Strategy that matched; persisted into the lock.
    pub mode: String,

    /// Concrete locator expression that matched (for diagnostics).
    pub locator: String,
}

/// A live automation session.
#[async_trait]
pub trait DriverSession: Send {
    /// PNG bytes of the current screen.
    async fn screenshot(&mut self) -> Result<Vec<u8>>;
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn title(&mut self) -> Result<String>;
    async fn current_url(&mut self) -> Result<String>;

    /// `Ok(None)` when nothing matches.
    async fn find(&mut self, using: &str, value: &str) -> Result<Option<ElementHandle>>;

    async fn click(&mut self, element: &ElementHandle) -> Result<()>;
    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()>;
    async fn clear(&mut self, element: &ElementHandle) -> Result<()>;
    async fn text(&mut self, element: &ElementHandle) -> Result<String>;
    async fn execute_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value>;
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait PlatformDriver: Send + Sync {
    fn kind(&self) -> PlatformKind;

    async fn init_driver(&self) -> Result<Box<dyn DriverSession>>;

    async fn init_app(
        &self,
        session: &mut dyn DriverSession,
        program: &Program,
        arguments: &Arguments,
    ) -> Result<()>;

    async fn find_element(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<Located>;
}

/// One way of turning a target description into a locator.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub mode: &'static str,

    /// WebDriver `using` value.
    pub using: &'static str,

    pub build: fn(&str) -> Option<String>,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("mode", &self.mode)
            .field("using", &self.using)
            .finish()
    }
}

/// Try strategies in order; a recorded mode restricts the search to that one.
pub async fn locate(
    session: &mut dyn DriverSession,
    strategies: &[Strategy],
    command: &Command,
) -> Result<Located> {
    let target = command
        .target()
        .with_context(|| format!("Command has no target: {}", command))?;

    let candidates: Vec<&Strategy> = match command.recorded_mode() {
        Some(mode) => {
            let s = strategies
                .iter()
                .find(|s| s.mode == mode)
                .with_context(|| format!("Unknown resolution mode {:?} for {}", mode, command))?;
            vec![s]
        }
        None => strategies.iter().collect(),
    };

    for strategy in &candidates {
        let Some(locator) = (strategy.build)(target) else {
            continue;
        };

        if let Some(element) = session.find(strategy.using, &locator).await? {
            return Ok(Located {
                element,
                mode: strategy.mode.to_string(),
                locator,
            });
        }
    }

    let tried: Vec<&str> = candidates.iter().map(|s| s.mode).collect();
    bail!(
        "Could not locate {:?} (tried: {})",
        target,
        tried.join(", ")
    )
}

/// Quote a string as an XPath 1.0 literal, splitting on quotes if needed.
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{}'", s);
    }
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }

    let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Platforms selected per runnable; read-only for the whole invocation.
#[derive(Clone)]
pub struct PlatformRegistry {
    drivers: BTreeMap<PlatformKind, Arc<dyn PlatformDriver>>,
}

impl PlatformRegistry {
    /// WebDriver-backed platforms from the settings.
    pub fn from_settings(platforms: &Platforms) -> Self {
        let mut reg = Self::empty();
        reg.register(Arc::new(web::WebPlatform::new(platforms.web.clone())));
        reg.register(Arc::new(mac::MacPlatform::new(platforms.mac.clone())));
        reg
    }

    pub fn empty() -> Self {
        Self {
            drivers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, driver: Arc<dyn PlatformDriver>) {
        self.drivers.insert(driver.kind(), driver);
    }

    /// Resolve a runnable's platform identifier.
    pub fn select(&self, platform: &str) -> Result<Arc<dyn PlatformDriver>> {
        let kind: PlatformKind = platform.parse()?;
        self.drivers
            .get(&kind)
            .cloned()
            .with_context(|| format!("No driver registered for platform {}", kind))
    }
}

#[cfg(test)]
pub mod fake;

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakeSession;

    fn strategies() -> Vec<Strategy> {
        vec![
            Strategy {
                mode: "id",
                using: "css selector",
                build: |t| Some(format!("#{}", t)),
            },
            Strategy {
                mode: "text",
                using: "xpath",
                build: |t| Some(format!("//*[text()={}]", xpath_literal(t))),
            },
        ]
    }

    fn click(target: &str, mode: Option<&str>) -> Command {
        let mut c: Command =
            serde_json::from_value(serde_json::json!({"action": "click", "target": target}))
                .unwrap();
        c.mode = mode.map(String::from);
        c
    }

    #[tokio::test]
    async fn first_matching_strategy_wins() {
        let mut s = FakeSession::default().with_element("xpath", "//*[text()='Login']");

        let found = locate(&mut s, &strategies(), &click("Login", None)).await.unwrap();
        assert_eq!(found.mode, "text");
        assert_eq!(found.locator, "//*[text()='Login']");
        assert_eq!(s.finds(), 2);
    }

    #[tokio::test]
    async fn recorded_mode_skips_the_search() {
        let mut s = FakeSession::default().with_element("xpath", "//*[text()='Login']");

        let found = locate(&mut s, &strategies(), &click("Login", Some("text")))
            .await
            .unwrap();
        assert_eq!(found.mode, "text");
        assert_eq!(s.finds(), 1);
    }

    #[tokio::test]
    async fn recorded_mode_does_not_fall_back() {
        let mut s = FakeSession::default().with_element("xpath", "//*[text()='Login']");

        let err = locate(&mut s, &strategies(), &click("Login", Some("id")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tried: id"));

        let err = locate(&mut s, &strategies(), &click("Login", Some("ocr")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown resolution mode"));
    }

    #[test]
    fn xpath_literals_handle_quotes() {
        assert_eq!(xpath_literal("Login"), "'Login'");
        assert_eq!(xpath_literal("Don't"), "\"Don't\"");
        assert_eq!(
            xpath_literal(r#"Say "don't""#),
            r#"concat('Say "don', "'", 't"')"#
        );
    }

    #[test]
    fn registry_rejects_unknown_platforms() {
        let reg = PlatformRegistry::from_settings(&Platforms::default());
        assert_eq!(reg.select("web").unwrap().kind(), PlatformKind::Web);
        assert_eq!(reg.select("mac").unwrap().kind(), PlatformKind::Mac);
        assert!(reg.select("windows").is_err());
    }
}
