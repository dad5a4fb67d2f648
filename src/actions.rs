// src/actions.rs

//! Action execution.
//!
//! Every command goes through [`ActionExecutor::execute_command`]:
//! 1. the non-element handler gets the first look (waits, navigation,
//!    page-level assertions); if it handles the command the mode is empty
//! 2. otherwise the executor pauses briefly, asks the platform to locate the
//!    target element, and performs the action on it
//! 3. the platform's resolution mode is returned so the caller can lock it
//!
//! The executor never interprets the mode itself.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::platform::{DriverSession, ElementHandle, PlatformDriver};
use crate::program::Command;

/// Handles commands that do not target an element.
#[async_trait]
pub trait NonElementHandler: Send + Sync {
    /// Returns `Ok(true)` when the command was handled.
    async fn try_execute(&self, session: &mut dyn DriverSession, command: &Command)
        -> Result<bool>;
}

/// Performs an element action once the element is located.
#[async_trait]
pub trait ActionPerformer: Send + Sync {
    async fn perform(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
        element: &ElementHandle,
    ) -> Result<()>;
}

/// Built-in action vocabulary.
///
/// Non-element: `wait`/`sleep` (seconds, 1 when omitted), `navigate`/`goto`
/// (url), `assert-title` (value), `assert-url` (value, substring).
///
/// Element: `click`, `type`/`enter` (value, optional clear),
/// `clear`, `assert-text` (value, substring), `assert-exists`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardActions;

#[async_trait]
impl NonElementHandler for StandardActions {
    async fn try_execute(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<bool> {
        let Some(action) = command.action() else {
            bail!("Command has no action: {}", command);
        };

        match action {
            "wait" | "sleep" => {
                let seconds = command.f64_param("seconds").unwrap_or(1.0).max(0.0);
                let pause = Duration::try_from_secs_f64(seconds)
                    .with_context(|| format!("Invalid wait of {} seconds", seconds))?;
                tokio::time::sleep(pause).await;
            }
            "navigate" | "goto" => {
                let url = command
                    .str_param("url")
                    .or_else(|| command.target())
                    .context("navigate needs a url")?;
                session.navigate(url).await?;
            }
            "assert-title" => {
                let expected = required_value(command)?;
                let title = session.title().await?;
                if title.trim() != expected.trim() {
                    bail!("Title mismatch: expected {:?}, got {:?}", expected, title);
                }
            }
            "assert-url" => {
                let expected = required_value(command)?;
                let url = session.current_url().await?;
                if !url.contains(expected) {
                    bail!("URL {:?} does not contain {:?}", url, expected);
                }
            }
            _ => return Ok(false),
        }

        Ok(true)
    }
}

#[async_trait]
impl ActionPerformer for StandardActions {
    async fn perform(
        &self,
        session: &mut dyn DriverSession,
        command: &Command,
        element: &ElementHandle,
    ) -> Result<()> {
        let action = command.action().unwrap_or_default();

        match action {
            "click" => session.click(element).await,
            "type" | "enter" => {
                let text = required_value(command)?;
                if command.bool_param("clear") {
                    session.clear(element).await?;
                }
                session.send_keys(element, text).await
            }
            "clear" => session.clear(element).await,
            "assert-text" => {
                let expected = required_value(command)?;
                let actual = session.text(element).await?;
                if !actual.contains(expected) {
                    bail!("Element text {:?} does not contain {:?}", actual, expected);
                }
                Ok(())
            }
            "assert-exists" => Ok(()),
            other => bail!("Unsupported action {:?}", other),
        }
    }
}

fn required_value(command: &Command) -> Result<&str> {
    command
        .str_param("value")
        .with_context(|| format!("{} needs a value", command.action().unwrap_or("action")))
}

/// Non-element handler + performer + the pause before element lookup.
pub struct ActionExecutor<'a> {
    pub handler: &'a dyn NonElementHandler,
    pub performer: &'a dyn ActionPerformer,
    pub delay: Duration,
}

impl ActionExecutor<'static> {
    pub fn standard(delay: Duration) -> Self {
        static STANDARD: StandardActions = StandardActions;
        Self {
            handler: &STANDARD,
            performer: &STANDARD,
            delay,
        }
    }
}

impl<'a> ActionExecutor<'a> {
    /// Execute one command; returns the resolution mode (empty for non-element actions).
    pub async fn execute_command(
        &self,
        platform: &dyn PlatformDriver,
        session: &mut dyn DriverSession,
        command: &Command,
    ) -> Result<String> {
        if self.handler.try_execute(session, command).await? {
            return Ok(String::new());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let located = platform.find_element(session, command).await?;
        debug!(mode = %located.mode, locator = %located.locator, "element located");

        self.performer
            .perform(session, command, &located.element)
            .await
            .with_context(|| format!("Action failed on {}", located.locator))?;

        Ok(located.mode)
    }
}
