use super::{Condition, Driver, Locator, Wait};
use crate::config::BrowserConfig;
use crate::error::DriverError;
use headless_chrome::util::Wait as Poll;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

fn browser_error<E: Display>(context: impl Display) -> impl FnOnce(E) -> DriverError {
    move |e| DriverError::Browser(format!("{context}: {e}"))
}

fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}

/// Chrome over the DevTools protocol.
///
/// Frames are not separate targets in CDP, so while a frame is entered all
/// lookups run as scripts against the frame's `contentDocument`.
pub struct ChromeDriver {
    browser: Browser,
    main: Arc<Tab>,
    tab: Arc<Tab>,
    frame: Option<String>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self, DriverError> {
        log::info!(
            "launching browser (headless: {}, size: {}x{})",
            config.headless,
            config.window_width,
            config.window_height
        );
        let user_agent = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={ua}"));
        let mut options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(IDLE_TIMEOUT)
            .build()
            .map_err(browser_error("failed to build launch options"))?;
        if let Some(arg) = &user_agent {
            options.args.push(OsStr::new(arg));
        }
        let browser = Browser::new(options).map_err(browser_error("failed to launch browser"))?;
        let tab = browser
            .new_tab()
            .map_err(browser_error("failed to create tab"))?;
        Ok(Self {
            browser,
            main: Arc::clone(&tab),
            tab,
            frame: None,
        })
    }
    fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(browser_error("script evaluation failed"))?;
        Ok(result.value.unwrap_or(Value::Null))
    }
    fn find(&self, locator: &Locator, wait: Wait) -> Result<Element<'_>, DriverError> {
        let tab = &self.tab;
        Poll::new(wait.timeout, POLL_INTERVAL)
            .until(|| {
                let element = match locator {
                    Locator::XPath(xpath) => tab.find_element_by_xpath(xpath).ok(),
                    Locator::Css(selector) => tab.find_element(selector).ok(),
                }?;
                match wait.condition {
                    Condition::Present => Some(element),
                    Condition::Clickable => element.get_box_model().ok().map(|_| element),
                }
            })
            .map_err(|_| DriverError::Timeout(locator.clone(), wait.timeout))
    }
    fn frame_root(&self) -> String {
        match &self.frame {
            Some(id) => format!("document.getElementById({}).contentDocument", js_string(id)),
            None => "document".to_string(),
        }
    }
    /// Evaluates `body` with the located element bound to `el`, polling until the
    /// element exists inside the current frame.
    fn frame_eval(&self, locator: &Locator, wait: Wait, body: &str) -> Result<Value, DriverError> {
        let lookup = match locator {
            Locator::XPath(xpath) => format!(
                "d.evaluate({}, d, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_string(xpath)
            ),
            Locator::Css(selector) => format!("d.querySelector({})", js_string(selector)),
        };
        let script = format!(
            "(function(d) {{ const el = {lookup}; if (!el) return {{ found: false }}; \
             return {{ found: true, value: (function(el) {{ {body} }})(el) }}; }})({})",
            self.frame_root()
        );
        Poll::new(wait.timeout, POLL_INTERVAL)
            .until(|| {
                let value = self.evaluate(&script).ok()?;
                match value.get("found") {
                    Some(Value::Bool(true)) => Some(value.get("value").cloned().unwrap_or(Value::Null)),
                    _ => None,
                }
            })
            .map_err(|_| DriverError::Timeout(locator.clone(), wait.timeout))
    }
}

impl Driver for ChromeDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        log::debug!("navigating to {url}");
        self.frame = None;
        self.tab
            .navigate_to(url)
            .map_err(browser_error(format!("failed to navigate to {url}")))?
            .wait_until_navigated()
            .map_err(browser_error(format!("navigation timeout for {url}")))?;
        Ok(())
    }
    fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.tab.get_url())
    }
    fn wait_for(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError> {
        if self.frame.is_some() {
            self.frame_eval(locator, wait, "return null;")?;
        } else {
            self.find(locator, wait)?;
        }
        Ok(())
    }
    fn click(&mut self, locator: &Locator, wait: Wait) -> Result<(), DriverError> {
        log::debug!("click {locator}");
        if self.frame.is_some() {
            self.frame_eval(locator, wait, "el.click(); return null;")?;
        } else {
            self.find(locator, wait)?
                .click()
                .map_err(browser_error(format!("failed to click {locator}")))?;
        }
        Ok(())
    }
    fn type_text(&mut self, locator: &Locator, text: &str, wait: Wait) -> Result<(), DriverError> {
        if self.frame.is_some() {
            let body = format!(
                "el.focus(); el.ownerDocument.execCommand('insertText', false, {}); return null;",
                js_string(text)
            );
            self.frame_eval(locator, wait, &body)?;
        } else {
            self.find(locator, wait)?
                .type_into(text)
                .map_err(browser_error(format!("failed to type into {locator}")))?;
        }
        Ok(())
    }
    fn attribute(
        &mut self,
        locator: &Locator,
        name: &str,
        wait: Wait,
    ) -> Result<Option<String>, DriverError> {
        // `value` and `href` are read as properties: the input's current value and
        // the link resolved against the page URL
        let property = matches!(name, "value" | "href");
        if self.frame.is_some() {
            let body = if property {
                format!("return el[{}];", js_string(name))
            } else {
                format!("return el.getAttribute({});", js_string(name))
            };
            let value = self.frame_eval(locator, wait, &body)?;
            return Ok(value.as_str().map(str::to_string));
        }
        let element = self.find(locator, wait)?;
        if property {
            let function = format!("function() {{ return this[{}]; }}", js_string(name));
            let value = element
                .call_js_fn(&function, Vec::new(), false)
                .map_err(browser_error(format!("failed to read {name} of {locator}")))?;
            return Ok(value
                .value
                .and_then(|v| v.as_str().map(str::to_string)));
        }
        element
            .get_attribute_value(name)
            .map_err(browser_error(format!("failed to read {name} of {locator}")))
    }
    fn set_file(&mut self, locator: &Locator, path: &Path, wait: Wait) -> Result<(), DriverError> {
        let path = path
            .canonicalize()?
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::Browser(format!("non UTF-8 path: {}", path.display())))?;
        self.find(locator, wait)?
            .set_input_files(&[path.as_str()])
            .map_err(browser_error(format!("failed to set file input {locator}")))?;
        Ok(())
    }
    fn execute_each(&mut self, selector: &str, script: &str) -> Result<usize, DriverError> {
        let script = format!(
            "(function(d) {{ const els = Array.from(d.querySelectorAll({})); \
             els.forEach(function(el) {{ {script} }}); return els.length; }})({})",
            js_string(selector),
            self.frame_root()
        );
        let value = self.evaluate(&script)?;
        Ok(value.as_u64().unwrap_or_default() as usize)
    }
    fn enter_frame(&mut self, id: &str) -> Result<(), DriverError> {
        let script = format!("document.getElementById({}) !== null", js_string(id));
        if self.evaluate(&script)? != Value::Bool(true) {
            return Err(DriverError::Timeout(
                Locator::css(format!("#{id}")),
                Duration::ZERO,
            ));
        }
        self.frame = Some(id.to_string());
        Ok(())
    }
    fn leave_frame(&mut self) {
        self.frame = None;
    }
    fn switch_to_window(&mut self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let tabs = self.browser.get_tabs();
        let tab = Poll::new(timeout, POLL_INTERVAL)
            .until(|| {
                let tabs = tabs.lock().ok()?;
                tabs.iter().find(|tab| tab.get_url().starts_with(url)).cloned()
            })
            .map_err(|_| DriverError::WindowNotFound(url.to_string()))?;
        log::debug!("switched to window {}", tab.get_url());
        self.tab = tab;
        self.frame = None;
        Ok(())
    }
    fn switch_to_main(&mut self) -> Result<(), DriverError> {
        self.tab = Arc::clone(&self.main);
        self.frame = None;
        Ok(())
    }
    fn wait_for_url_change(&mut self, from: &str, timeout: Duration) -> Result<(), DriverError> {
        let tab = &self.tab;
        Poll::new(timeout, POLL_INTERVAL)
            .until(|| Some(tab.get_url()).filter(|url| url != from))
            .map(|_| ())
            .map_err(|_| DriverError::Browser(format!("url did not change from {from} within {timeout:?}")))
    }
    fn close_windows(&mut self, url: &str) -> Result<usize, DriverError> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(browser_error("tab list lock poisoned"))?
            .clone();
        let mut closed = 0;
        for tab in tabs {
            if Arc::ptr_eq(&tab, &self.main) || !tab.get_url().starts_with(url) {
                continue;
            }
            if Arc::ptr_eq(&tab, &self.tab) {
                self.tab = Arc::clone(&self.main);
                self.frame = None;
            }
            tab.close(false)
                .map_err(browser_error(format!("failed to close window {url}")))?;
            closed += 1;
        }
        Ok(closed)
    }
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
    fn quit(&mut self) -> Result<(), DriverError> {
        log::info!("closing browser");
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(browser_error("tab list lock poisoned"))?
            .clone();
        for tab in tabs {
            if let Err(e) = tab.close(false) {
                log::warn!("failed to close tab: {e}");
            }
        }
        Ok(())
    }
}
