// src/platform/fake.rs

//! In-memory platform used by tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{locate, xpath_literal, DriverSession, ElementHandle, Located, PlatformDriver, Strategy};
use crate::program::{expand_placeholders, Command, Program};
use crate::suite::{Arguments, PlatformKind};

#[derive(Debug, Default)]
pub struct FakeState {
    /// (using, value) → element id
    pub elements: BTreeMap<(String, String), String>,
    /// element id → visible text
    pub texts: BTreeMap<String, String>,
    pub title: String,
    pub url: String,
    /// Every side effect, in order: "navigate:..", "click:e1", "keys:e1:..", "screenshot", "close"
    pub log: Vec<String>,
    pub finds: usize,
    pub sessions_opened: usize,
    pub closed: usize,
}

/// Session whose state is shared with the test that created it.
#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn with_element(self, using: &str, value: &str) -> Self {
        {
            let mut st = self.state.lock().unwrap();
            let id = format!("e{}", st.elements.len() + 1);
            st.elements.insert((using.to_string(), value.to_string()), id);
        }
        self
    }

    pub fn finds(&self) -> usize {
        self.state.lock().unwrap().finds
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn push(&self, entry: String) {
        self.state.lock().unwrap().log.push(entry);
    }
}

#[async_trait]
impl DriverSession for FakeSession {
    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        self.push("screenshot".into());
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.url = url.to_string();
        st.log.push(format!("navigate:{}", url));
        Ok(())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn find(&mut self, using: &str, value: &str) -> Result<Option<ElementHandle>> {
        let mut st = self.state.lock().unwrap();
        st.finds += 1;
        Ok(st
            .elements
            .get(&(using.to_string(), value.to_string()))
            .cloned()
            .map(ElementHandle))
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.push(format!("click:{}", element.0));
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> Result<()> {
        self.push(format!("keys:{}:{}", element.0, text));
        Ok(())
    }

    async fn clear(&mut self, element: &ElementHandle) -> Result<()> {
        self.push(format!("clear:{}", element.0));
        Ok(())
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .texts
            .get(&element.0)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute_script(&mut self, script: &str, _args: Vec<Value>) -> Result<Value> {
        self.push(format!("script:{}", script));
        Ok(Value::Null)
    }

    async fn close(&mut self) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        st.closed += 1;
        st.log.push("close".into());
        Ok(())
    }
}

/// Platform with two strategies: `id` (css `#target`) then `xpath` (exact text).
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    pub session: FakeSession,
    pub fail_init: bool,
}

impl FakePlatform {
    pub fn new(session: FakeSession) -> Self {
        Self {
            session,
            fail_init: false,
        }
    }

    pub fn text_xpath(target: &str) -> String {
        format!("//*[normalize-space(text())={}]", xpath_literal(target))
    }
}

const FAKE_STRATEGIES: &[Strategy] = &[
    Strategy {
        mode: "id",
        using: "css selector",
        build: by_id,
    },
    Strategy {
        mode: "xpath",
        using: "xpath",
        build: by_text,
    },
];

fn by_id(target: &str) -> Option<String> {
    Some(format!("#{}", target))
}

fn by_text(target: &str) -> Option<String> {
    Some(FakePlatform::text_xpath(target))
}

#[async_trait]
impl PlatformDriver for FakePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Web
    }

    async fn init_driver(&self) -> Result<Box<dyn DriverSession>> {
        if self.fail_init {
            bail!("driver unavailable");
        }
        self.session.state.lock().unwrap().sessions_opened += 1;
        Ok(Box::new(self.session.clone()))
    }

    async fn init_app(
        &self,
        session: &mut dyn DriverSession,
        program: &Program,
        arguments: &Arguments,
    ) -> Result<()> {
        let open = program.open.as_deref().unwrap_or_default();
        session.navigate(&expand_placeholders(open, arguments)).await
    }

    async fn find_element(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<Located> {
        locate(session, FAKE_STRATEGIES, command).await
    }
}
