//! The browser boundary. The workflow only talks to [`Driver`], so it can be
//! exercised without a real browser.

mod chrome;
#[cfg(test)]
pub(crate) mod fake;

pub use self::chrome::ChromeDriver;
use crate::error::DriverError;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(Cow<'static, str>),
    Css(Cow<'static, str>),
}

impl Locator {
    pub const fn xpath_static(xpath: &'static str) -> Self {
        Self::XPath(Cow::Borrowed(xpath))
    }
    pub fn xpath(xpath: impl Into<Cow<'static, str>>) -> Self {
        Self::XPath(xpath.into())
    }
    pub fn css(selector: impl Into<Cow<'static, str>>) -> Self {
        Self::Css(selector.into())
    }
    pub fn as_str(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) => s,
        }
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(xpath) => write!(f, "xpath {xpath}"),
            Self::Css(selector) => write!(f, "css {selector}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Present,
    Clickable,
}

/// How long, and for what, a lookup polls before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub condition: Condition,
    pub timeout: Duration,
}

impl Wait {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn present(timeout: Duration) -> Self {
        Self {
            condition: Condition::Present,
            timeout,
        }
    }
    pub fn clickable(timeout: Duration) -> Self {
        Self {
            condition: Condition::Clickable,
            timeout,
        }
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::present(Self::DEFAULT_TIMEOUT)
    }
}

/// Blocking browser operations. Every element operation first polls for the
/// element according to `wait` and fails with [`DriverError::Timeout`] when it
/// never shows up.
pub trait Driver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;
    fn current_url(&mut self) -> Result<String, DriverError>;
    fn wait_for(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError>;
    fn click(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError>;
    fn type_text(&mut self, locator: &Locator, text: &str, wait: Wait) -> Result<(), DriverError>;
    fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
        wait: Wait,
    ) -> Result<Option<String>, DriverError>;
    fn set_file(&mut self, locator: &Locator, path: &Path, wait: Wait) -> Result<(), DriverError>;
    /// Runs `script` once for every element matching the CSS `selector`, with the
    /// element bound to `el`. Returns the number of matched elements.
    fn execute_each(&mut self, selector: &str, script: &str) -> Result<usize, DriverError>;
    fn enter_frame(&mut self, id: &str) -> Result<(), DriverError>;
    fn leave_frame(&mut self);
    /// Makes the window whose URL starts with `url` the active one.
    fn switch_to_window(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError>;
    fn switch_to_main(&mut self) -> Result<(), DriverError>;
    /// Closes every window other than the main one whose URL starts with `url`.
    /// Returns how many were closed.
    fn close_windows(&mut self, url: &str) -> Result<usize, DriverError>;
    fn wait_for_url_change(&mut self, from: &str, timeout: Duration) -> Result<(), DriverError>;
    fn pause(&mut self, duration: Duration);
    fn quit(&mut self) -> Result<(), DriverError>;
}

/// Quotes `s` as an XPath string literal, falling back to `concat()` when it
/// contains both quote characters.
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{s}'")
    } else if !s.contains('"') {
        format!("\"{s}\"")
    } else {
        let parts = s
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect::<Vec<_>>()
            .join(", \"'\", ");
        format!("concat({parts})")
    }
}
