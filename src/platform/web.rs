// src/platform/web.rs

//! Browser platform (`"platform": "web"`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::webdriver::new_session;
use super::{locate, xpath_literal, DriverSession, Located, PlatformDriver, Strategy};
use crate::config::PlatformEndpoint;
use crate::program::{expand_placeholders, Command, Program};
use crate::suite::{Arguments, PlatformKind};

/// Element strategies, most specific first.
///
/// The `mode` names are what ends up in lock files; renaming one
/// invalidates every lock that recorded it.
pub const WEB_STRATEGIES: &[Strategy] = &[
    Strategy {
        mode: "id",
        using: "xpath",
        build: by_id,
    },
    Strategy {
        mode: "name",
        using: "xpath",
        build: by_name,
    },
    Strategy {
        mode: "link",
        using: "link text",
        build: by_link,
    },
    Strategy {
        mode: "text",
        using: "xpath",
        build: by_text,
    },
    Strategy {
        mode: "label",
        using: "xpath",
        build: by_label,
    },
    Strategy {
        mode: "placeholder",
        using: "xpath",
        build: by_placeholder,
    },
    Strategy {
        mode: "aria-label",
        using: "xpath",
        build: by_aria_label,
    },
    Strategy {
        mode: "css",
        using: "css selector",
        build: by_css,
    },
    Strategy {
        mode: "xpath",
        using: "xpath",
        build: by_xpath,
    },
];

fn by_id(t: &str) -> Option<String> {
    Some(format!("//*[@id={}]", xpath_literal(t)))
}

fn by_name(t: &str) -> Option<String> {
    Some(format!("//*[@name={}]", xpath_literal(t)))
}

fn by_link(t: &str) -> Option<String> {
    Some(t.to_string())
}

fn by_text(t: &str) -> Option<String> {
    let lit = xpath_literal(t);
    Some(format!(
        "//*[normalize-space(text())={lit} or (self::input and @value={lit})]"
    ))
}

fn by_label(t: &str) -> Option<String> {
    Some(format!(
        "//*[@id=//label[normalize-space(.)={}]/@for]",
        xpath_literal(t)
    ))
}

fn by_placeholder(t: &str) -> Option<String> {
    Some(format!("//*[@placeholder={}]", xpath_literal(t)))
}

fn by_aria_label(t: &str) -> Option<String> {
    Some(format!("//*[@aria-label={}]", xpath_literal(t)))
}

/// Raw CSS selectors only: `#login`, `.btn`, `form > input`, ...
fn by_css(t: &str) -> Option<String> {
    let looks_like_css = t.starts_with(['#', '.', '['])
        || t.contains(['>', '=', ':'])
        || t.contains(" .");
    looks_like_css.then(|| t.to_string())
}

/// Raw XPath expressions only.
fn by_xpath(t: &str) -> Option<String> {
    (t.starts_with('/') || t.starts_with("(/")).then(|| t.to_string())
}

pub struct WebPlatform {
    endpoint: PlatformEndpoint,
}

impl WebPlatform {
    pub fn new(endpoint: PlatformEndpoint) -> Self {
        Self { endpoint }
    }

    fn capabilities(&self) -> Value {
        let mut caps = json!({ "browserName": "chrome" });
        if let Some(obj) = caps.as_object_mut() {
            for (k, v) in &self.endpoint.capabilities {
                obj.insert(k.clone(), v.clone());
            }
        }
        caps
    }
}

#[async_trait]
impl PlatformDriver for WebPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Web
    }

    async fn init_driver(&self) -> Result<Box<dyn DriverSession>> {
        let session = new_session(&self.endpoint.endpoint, self.capabilities()).await?;
        Ok(Box::new(session))
    }

    /// Navigate to the program's `open` URL, with `${KEY}` placeholders expanded.
    async fn init_app(
        &self,
        session: &mut dyn DriverSession,
        program: &Program,
        arguments: &Arguments,
    ) -> Result<()> {
        let open = program.open.as_deref().context("Program Error! Open not specified!")?;
        let url = expand_placeholders(open, arguments);

        tracing::info!(url = %url, "opening page");
        session.navigate(&url).await
    }

    async fn find_element(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<Located> {
        locate(session, WEB_STRATEGIES, command).await
    }
}
