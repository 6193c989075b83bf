use super::{Driver, Locator, Wait};
use crate::error::DriverError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// A scripted driver: every locator resolves unless listed in `missing`, or
/// unless the lookup gives up sooner than `appear_after`.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub url: String,
    pub missing: HashSet<String>,
    pub appear_after: Duration,
    pub attributes: HashMap<(String, String), String>,
    pub missing_windows: HashSet<String>,
    pub url_changes: bool,
    pub calls: Vec<String>,
    pub quit: bool,
    frame: Option<String>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            url_changes: true,
            ..Default::default()
        }
    }
    pub fn missing(mut self, locator: impl Into<String>) -> Self {
        self.missing.insert(locator.into());
        self
    }
    pub fn missing_window(mut self, url: impl Into<String>) -> Self {
        self.missing_windows.insert(url.into());
        self
    }
    pub fn attribute(
        mut self,
        locator: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .insert((locator.into(), name.into()), value.into());
        self
    }
    pub fn calls_matching(&self, prefix: &str) -> Vec<&str> {
        self.calls
            .iter()
            .map(String::as_str)
            .filter(|call| call.starts_with(prefix))
            .collect()
    }
    fn lookup(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError> {
        if self.missing.contains(locator.as_str()) || wait.timeout < self.appear_after {
            self.calls.push(format!("timeout {}", locator.as_str()));
            Err(DriverError::Timeout(locator.clone(), wait.timeout))
        } else {
            Ok(())
        }
    }
}

impl Driver for FakeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.calls.push(format!("navigate {url}"));
        self.url = url.to_string();
        self.frame = None;
        Ok(())
    }
    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }
    fn wait_for(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError> {
        self.lookup(locator, wait)?;
        self.calls.push(format!("wait {}", locator.as_str()));
        Ok(())
    }
    fn click(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError> {
        self.lookup(locator, wait)?;
        self.calls.push(format!("click {}", locator.as_str()));
        Ok(())
    }
    fn type_text(&mut self, locator: &Locator, text: &str, wait: Wait) -> Result<(), DriverError> {
        self.lookup(locator, wait)?;
        let place = self.frame.as_deref().unwrap_or("main");
        self.calls
            .push(format!("type {} {place} {text}", locator.as_str()));
        Ok(())
    }
    fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
        wait: Wait,
    ) -> Result<Option<String>, DriverError> {
        self.lookup(locator, wait)?;
        Ok(self
            .attributes
            .get(&(locator.as_str().to_string(), name.to_string()))
            .cloned())
    }
    fn set_file(&mut self, locator: &Locator, path: &Path, wait: Wait) -> Result<(), DriverError> {
        self.lookup(locator, wait)?;
        self.calls.push(format!("file {}", path.display()));
        Ok(())
    }
    fn execute_each(&mut self, selector: &str, _script: &str) -> Result<usize, DriverError> {
        self.calls.push(format!("execute {selector}"));
        Ok(1)
    }
    fn enter_frame(&mut self, id: &str) -> Result<(), DriverError> {
        self.calls.push(format!("frame {id}"));
        self.frame = Some(id.to_string());
        Ok(())
    }
    fn leave_frame(&mut self) {
        self.frame = None;
    }
    fn switch_to_window(&mut self, url: &str, _timeout: Duration) -> Result<(), DriverError> {
        if self.missing_windows.contains(url) {
            return Err(DriverError::WindowNotFound(url.to_string()));
        }
        self.calls.push(format!("window {url}"));
        Ok(())
    }
    fn switch_to_main(&mut self) -> Result<(), DriverError> {
        self.calls.push("window main".to_string());
        Ok(())
    }
    fn close_windows(&mut self, url: &str) -> Result<usize, DriverError> {
        self.calls.push(format!("close {url}"));
        Ok(1)
    }
    fn wait_for_url_change(&mut self, from: &str, timeout: Duration) -> Result<(), DriverError> {
        if self.url_changes {
            self.url = format!("{from}#changed");
            Ok(())
        } else {
            Err(DriverError::Browser(format!(
                "url did not change from {from} within {timeout:?}"
            )))
        }
    }
    fn pause(&mut self, duration: Duration) {
        self.calls.push(format!("pause {}", duration.as_secs()));
    }
    fn quit(&mut self) -> Result<(), DriverError> {
        self.quit = true;
        Ok(())
    }
}
