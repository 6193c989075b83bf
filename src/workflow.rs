//! The posting run: authenticate once, resolve destinations, then post to each
//! destination in turn.
//!
//! Errors are handled at the smallest unit of work they belong to. A failed
//! attachment is reported and the next one is tried; a failed destination is
//! reported and the next destination is tried. Only a failed login or an empty
//! set of resolved destinations ends the run.

use crate::attachment::{AttachmentItem, AttachmentKind};
use crate::config::{BrowserConfig, Config, Timeouts};
use crate::driver::{ChromeDriver, Driver, Wait};
use crate::error::{PostError, Result};
use crate::form::{Credentials, Formatting, PostJob};
use crate::report::{Reporter, RunEvent, RunSummary};
use crate::site::{self, PostingContext, UploadTarget};
use indexmap::IndexMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{self, JoinHandle};

pub struct Runner<D> {
    driver: D,
    base_url: String,
    timeouts: Timeouts,
    reporter: Reporter,
}

impl<D: Driver> Runner<D> {
    pub fn new(driver: D, base_url: String, timeouts: Timeouts, reporter: Reporter) -> Self {
        Self {
            driver,
            base_url,
            timeouts,
            reporter,
        }
    }
    /// Runs the whole batch and closes the browser afterwards, whatever the outcome.
    pub fn run(&mut self, job: &PostJob) -> Result<RunSummary> {
        let result = self.run_batch(job);
        // fatal errors are reported where they happen
        if let Some(e) = result.as_ref().err().filter(|e| !e.is_fatal()) {
            self.reporter.error(e);
        }
        if let Err(e) = self.driver.quit() {
            log::warn!("failed to quit browser: {e}");
        }
        result
    }
    pub fn into_driver(self) -> D {
        self.driver
    }
    fn run_batch(&mut self, job: &PostJob) -> Result<RunSummary> {
        let base_url = self.base_url.clone();
        self.driver.navigate(&base_url)?;
        self.reporter.info("Start");

        let context = PostingContext::new(job.login);
        if context == PostingContext::Member {
            if let Err(e) = self.authenticate(&job.credentials) {
                let err = PostError::AuthenticationFailed(Box::new(e));
                self.reporter.error(&err);
                return Err(err);
            }
            // the login redirect does not necessarily land on the gallery index
            self.driver.navigate(&base_url)?;
        }

        let mut summary = RunSummary::default();
        let links = self.resolve_destinations(&job.destinations, &mut summary);
        if links.is_empty() {
            let err = PostError::NoDestinationsResolved;
            self.reporter.error(&err);
            return Err(err);
        }

        for (name, url) in &links {
            self.reporter.info(format!("{name}: opening gallery..."));
            match self.post_to(url, job, context) {
                Ok(()) => {
                    self.reporter.success(format!("{name}: posted"));
                    summary.posted.push(name.clone());
                }
                Err(e) => {
                    self.reporter.error(PostError::PostingFailed {
                        destination: name.clone(),
                        source: Box::new(e),
                    });
                    summary.failed.push(name.clone());
                    self.recover();
                }
            }
        }
        Ok(summary)
    }
    fn present(&self) -> Wait {
        Wait::present(self.timeouts.element())
    }
    fn clickable(&self) -> Wait {
        Wait::clickable(self.timeouts.element())
    }
    /// Returns to the top-level document of the main window after a failure.
    fn recover(&mut self) {
        self.driver.leave_frame();
        if let Err(e) = self.driver.switch_to_main() {
            log::warn!("failed to switch back to main window: {e}");
        }
    }
    fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let (present, clickable) = (self.present(), self.clickable());
        self.driver.click(&site::LOGIN_LINK, clickable)?;
        self.driver
            .type_text(&site::LOGIN_ID, &credentials.nickname, present)?;
        self.driver
            .type_text(&site::LOGIN_PASSWORD, &credentials.password, present)?;
        self.driver.wait_for(&site::LOGIN_SUBMIT, clickable)?;
        let before = self.driver.current_url()?;
        self.driver.click(&site::LOGIN_SUBMIT, clickable)?;
        self.driver
            .wait_for_url_change(&before, self.timeouts.login())?;
        log::info!("logged in as {}", credentials.nickname);
        Ok(())
    }
    /// Looks each name up on the landing page. The first lookup waits for the page
    /// to render; the rest check once. Unknown names are reported and skipped; a
    /// repeated name is only posted to once.
    fn resolve_destinations(
        &mut self,
        names: &[String],
        summary: &mut RunSummary,
    ) -> IndexMap<String, String> {
        let mut links = IndexMap::new();
        let mut wait = self.present();
        for name in names {
            if name.is_empty() {
                break;
            }
            let href = self
                .driver
                .attribute(&site::destination_link(name), "href", wait)
                .unwrap_or_else(|e| {
                    log::debug!("lookup of {name} failed: {e}");
                    None
                });
            wait = Wait::present(Duration::ZERO);
            match href {
                Some(href) => {
                    links.insert(name.clone(), site::absolute_url(&self.base_url, &href));
                }
                None => {
                    self.reporter
                        .error(PostError::DestinationNotFound(name.clone()));
                    summary.unresolved.push(name.clone());
                }
            }
        }
        links
    }
    fn post_to(&mut self, url: &str, job: &PostJob, context: PostingContext) -> Result<()> {
        self.driver.navigate(url)?;
        self.open_editor()?;
        self.fill_metadata(job, context)?;
        self.apply_formatting(job.formatting, context)?;
        self.upload_attachments(&job.attachments);
        self.apply_alignment(job.formatting.center)?;
        self.submit(context)
    }
    fn open_editor(&mut self) -> Result<()> {
        let clickable = self.clickable();
        self.driver.wait_for(&site::WRITE_BUTTON, clickable)?;
        self.driver.pause(self.timeouts.click_delay());
        self.driver.click(&site::WRITE_BUTTON, clickable)?;
        Ok(())
    }
    fn fill_metadata(&mut self, job: &PostJob, context: PostingContext) -> Result<()> {
        let present = self.present();
        if context == PostingContext::Guest {
            // the site may pre-fill the nickname of a previous guest post
            let saved = self
                .driver
                .attribute(&site::GUEST_SAVED_NICKNAME, "value", present)?;
            if saved.is_some_and(|s| !s.trim().is_empty()) {
                let clickable = self.clickable();
                self.driver.click(&site::GUEST_CLEAR_NICKNAME, clickable)?;
            }
            self.driver
                .type_text(&site::GUEST_NICKNAME, &job.credentials.nickname, present)?;
            self.driver
                .type_text(&site::GUEST_PASSWORD, &job.credentials.password, present)?;
        }
        self.driver.type_text(&context.title(), &job.title, present)?;
        Ok(())
    }
    fn apply_formatting(&mut self, formatting: Formatting, context: PostingContext) -> Result<()> {
        let present = self.present();
        let form = context.form();
        if formatting.bold {
            self.driver.click(&form.bold, present)?;
        }
        if let Some(size) = formatting.font_size {
            self.driver.click(&form.font_size_menu, present)?;
            self.driver.click(&site::font_size(size), present)?;
        }
        Ok(())
    }
    fn upload_attachments(&mut self, items: &[AttachmentItem]) {
        for item in items {
            if let Err(e) = self.upload_attachment(item) {
                self.reporter.error(&e);
                self.recover();
            }
        }
    }
    fn upload_attachment(&mut self, item: &AttachmentItem) -> Result<()> {
        let kind = item.kind();
        match (kind, UploadTarget::for_kind(kind), item.path()) {
            (AttachmentKind::Text, _, _) => {
                let content = item
                    .text_content()
                    .map_err(|e| PostError::AttachmentUploadFailed {
                        path: item.path().map(Path::to_path_buf).unwrap_or_default(),
                        reason: e.to_string(),
                    })?
                    .unwrap_or_default();
                self.insert_text(&content)
            }
            (_, Some(target), Some(path)) => {
                let done_timeout = match kind {
                    AttachmentKind::Video => self.timeouts.video_upload(),
                    _ => self.timeouts.image_upload(),
                };
                let popup = target.popup_url(&self.base_url);
                let result = self.upload_media(path, target, &popup, done_timeout);
                if result.is_err() {
                    // a stale popup would be picked up by the next upload
                    match self.driver.close_windows(&popup) {
                        Ok(closed) => log::debug!("closed {closed} windows at {popup}"),
                        Err(e) => log::warn!("failed to close {popup}: {e}"),
                    }
                }
                result.map_err(|e| PostError::AttachmentUploadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            _ => Err(PostError::UnknownAttachmentKind {
                kind,
                item: item.to_string(),
            }),
        }
    }
    fn upload_media(
        &mut self,
        path: &Path,
        target: &UploadTarget,
        popup: &str,
        done: Duration,
    ) -> Result<()> {
        let present = self.present();
        log::debug!("uploading {}", path.display());
        self.driver.click(&target.entry, present)?;
        self.driver
            .switch_to_window(popup, self.timeouts.element())?;
        self.driver.set_file(&site::FILE_INPUT, path, present)?;
        self.driver.wait_for(&target.done, Wait::present(done))?;
        self.driver.click(&target.confirm, present)?;
        self.driver.switch_to_main()?;
        Ok(())
    }
    fn insert_text(&mut self, content: &str) -> Result<()> {
        let present = self.present();
        self.driver.enter_frame(site::EDITOR_FRAME)?;
        self.driver.type_text(&site::EDITOR_BODY, content, present)?;
        self.driver.leave_frame();
        Ok(())
    }
    fn apply_alignment(&mut self, center: bool) -> Result<()> {
        if !center {
            return Ok(());
        }
        self.driver.enter_frame(site::EDITOR_FRAME)?;
        for (selector, script) in site::CENTER_ALIGN {
            let count = self.driver.execute_each(selector, script)?;
            log::debug!("centered {count} elements matching {selector}");
        }
        self.driver.leave_frame();
        Ok(())
    }
    fn submit(&mut self, context: PostingContext) -> Result<()> {
        let present = self.present();
        self.driver.click(&context.form().submit, present)?;
        self.driver.pause(self.timeouts.settle());
        Ok(())
    }
}

/// What a run needs from the configuration besides the job itself.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub browser: BrowserConfig,
    pub base_url: String,
    pub timeouts: Timeouts,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            browser: config.browser.clone(),
            base_url: config.site.base_url.clone(),
            timeouts: config.timeouts.clone(),
        }
    }
}

/// Runs `job` against a fresh browser on a blocking worker thread. Progress and
/// the final result arrive on `tx`; nothing else is shared with the caller.
pub fn spawn(job: PostJob, settings: RunSettings, tx: UnboundedSender<RunEvent>) -> JoinHandle<()> {
    task::spawn_blocking(move || {
        let reporter = Reporter::new(tx);
        let result = match ChromeDriver::launch(&settings.browser) {
            Ok(driver) => {
                Runner::new(driver, settings.base_url, settings.timeouts, reporter.clone())
                    .run(&job)
                    .map_err(|e| e.to_string())
            }
            Err(e) => {
                reporter.error(&e);
                Err(e.to_string())
            }
        };
        reporter.finish(result);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;
    use crate::form::FontSize;
    use crate::report::Level;
    use std::path::PathBuf;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    const BASE: &str = "https://gall.example.com/";

    fn job(destinations: &[&str]) -> PostJob {
        PostJob {
            credentials: Credentials {
                nickname: "ferris".into(),
                password: "crab".into(),
            },
            title: "hello".into(),
            formatting: Formatting::default(),
            login: false,
            attachments: Vec::new(),
            destinations: destinations.iter().map(ToString::to_string).collect(),
        }
    }

    fn with_links(mut driver: FakeDriver, names: &[&str]) -> FakeDriver {
        for name in names {
            driver = driver.attribute(
                site::destination_link(name).as_str(),
                "href",
                format!("{BASE}board/{name}"),
            );
        }
        driver
    }

    fn run(driver: FakeDriver, job: &PostJob) -> (Result<RunSummary>, FakeDriver, Vec<(Level, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut runner = Runner::new(driver, BASE.into(), Timeouts::default(), Reporter::new(tx));
        let result = runner.run(job);
        (result, runner.into_driver(), drain(rx))
    }

    fn drain(mut rx: UnboundedReceiver<RunEvent>) -> Vec<(Level, String)> {
        let mut logs = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::Log(entry) = event {
                logs.push((entry.level, entry.message));
            }
        }
        logs
    }

    fn errors(logs: &[(Level, String)]) -> Vec<&str> {
        logs.iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    #[test]
    fn posts_only_to_resolved_destinations() {
        let driver = with_links(FakeDriver::new(), &["A", "C"]);
        let (result, driver, logs) = run(driver, &job(&["A", "B", "C"]));
        let summary = result.expect("run should succeed");
        assert_eq!(summary.posted, vec!["A", "C"]);
        assert_eq!(summary.unresolved, vec!["B"]);
        assert!(summary.failed.is_empty());
        assert_eq!(errors(&logs), vec!["destination not found: B"]);
        let successes = logs
            .iter()
            .filter(|(level, _)| *level == Level::Success)
            .count();
        assert_eq!(successes, 2);
        assert_eq!(
            driver.calls_matching("navigate "),
            vec![
                format!("navigate {BASE}"),
                format!("navigate {BASE}board/A"),
                format!("navigate {BASE}board/C"),
            ]
        );
        assert!(driver.quit);
    }

    #[test]
    fn no_resolved_destinations_aborts_before_posting() {
        let (result, driver, logs) = run(FakeDriver::new(), &job(&["X", "Y"]));
        assert!(matches!(result, Err(PostError::NoDestinationsResolved)));
        assert_eq!(
            errors(&logs),
            vec![
                "destination not found: X",
                "destination not found: Y",
                "no destinations resolved"
            ]
        );
        assert_eq!(driver.calls_matching("navigate ").len(), 1);
        assert!(driver.calls_matching("click ").is_empty());
        assert!(driver.quit);
    }

    #[test]
    fn authentication_timeout_aborts_the_batch() {
        let mut driver = with_links(FakeDriver::new(), &["A", "B"]);
        driver.url_changes = false;
        let mut job = job(&["A", "B"]);
        job.login = true;
        let (result, driver, logs) = run(driver, &job);
        let err = result.expect_err("login should fail");
        assert!(err.is_fatal());
        assert!(matches!(err, PostError::AuthenticationFailed(_)));
        assert_eq!(errors(&logs).len(), 1);
        assert_eq!(driver.calls_matching("navigate ").len(), 1);
        assert!(driver.quit);
    }

    #[test]
    fn missing_login_form_aborts_the_batch() {
        let driver = with_links(FakeDriver::new(), &["A"]).missing(site::LOGIN_ID.as_str());
        let mut job = job(&["A"]);
        job.login = true;
        let (result, _, logs) = run(driver, &job);
        assert!(matches!(result, Err(PostError::AuthenticationFailed(_))));
        assert!(errors(&logs)[0].starts_with("authentication failed: element not found"));
    }

    #[test]
    fn member_posting_types_only_the_title() {
        let driver = with_links(FakeDriver::new(), &["A"]);
        let mut job = job(&["A"]);
        job.login = true;
        let (result, driver, _) = run(driver, &job);
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
        let typed = driver.calls_matching("type ");
        assert_eq!(
            typed,
            vec![
                format!("type {} main ferris", site::LOGIN_ID.as_str()),
                format!("type {} main crab", site::LOGIN_PASSWORD.as_str()),
                format!("type {} main hello", site::MEMBER_TITLE.as_str()),
            ]
        );
        assert_eq!(
            driver.calls_matching("click ").last().copied(),
            Some(format!("click {}", PostingContext::Member.form().submit.as_str()).as_str())
        );
    }

    #[test]
    fn guest_posting_clears_saved_nickname() {
        let driver = with_links(FakeDriver::new(), &["A"]).attribute(
            site::GUEST_SAVED_NICKNAME.as_str(),
            "value",
            "previous",
        );
        let (result, driver, _) = run(driver, &job(&["A"]));
        assert!(result.is_ok());
        let clear = format!("click {}", site::GUEST_CLEAR_NICKNAME.as_str());
        assert!(driver.calls.contains(&clear));
        assert_eq!(driver.calls_matching("type ").len(), 3);
    }

    #[test]
    fn destination_failure_does_not_stop_the_next_one() {
        let driver = with_links(FakeDriver::new(), &["A", "B"])
            .missing(PostingContext::Guest.form().submit.as_str());
        let (result, _, logs) = run(driver, &job(&["A", "B"]));
        let summary = result.expect("run should complete");
        assert_eq!(summary.failed, vec!["A", "B"]);
        let errors = errors(&logs);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("failed to post to A: element not found"));
        assert!(errors[1].starts_with("failed to post to B"));
    }

    #[test]
    fn upload_failure_continues_with_next_attachment() {
        let video = UploadTarget::for_kind(AttachmentKind::Video).expect("video target");
        let driver = with_links(FakeDriver::new(), &["A"]).missing(video.done.as_str());
        let mut job = job(&["A"]);
        job.attachments = vec![
            AttachmentItem::File(PathBuf::from("clip.mp4")),
            AttachmentItem::File(PathBuf::from("cat.png")),
            AttachmentItem::File(PathBuf::from("clip.webm")),
            AttachmentItem::Text("caption".into()),
        ];
        let (result, driver, logs) = run(driver, &job);
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
        assert_eq!(
            driver.calls_matching("file "),
            vec!["file clip.mp4", "file cat.png"]
        );
        assert!(driver
            .calls
            .contains(&format!("type {} {} caption", site::EDITOR_BODY.as_str(), site::EDITOR_FRAME)));
        let errors = errors(&logs);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("failed to upload clip.mp4"));
        assert_eq!(errors[1], "unknown attachment kind (unknown): clip.webm");
    }

    #[test]
    fn attachments_are_uploaded_in_order() {
        let driver = with_links(FakeDriver::new(), &["A"]);
        let mut job = job(&["A"]);
        job.attachments = vec![
            AttachmentItem::Text("first".into()),
            AttachmentItem::File(PathBuf::from("b.jpg")),
            AttachmentItem::File(PathBuf::from("c.mp4")),
        ];
        let (_, driver, _) = run(driver, &job);
        let order = driver
            .calls
            .iter()
            .filter(|c| c.starts_with("file ") || c.contains(" caption") || c.ends_with(" first"))
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(order.len(), 3);
        assert!(order[0].ends_with("first"));
        assert_eq!(order[1], "file b.jpg");
        assert_eq!(order[2], "file c.mp4");
        assert_eq!(
            driver.calls_matching("window "),
            vec![
                format!("window {BASE}upload/image"),
                "window main".to_string(),
                format!("window {BASE}upload/movie"),
                "window main".to_string(),
            ]
        );
    }

    #[test]
    fn formatting_and_alignment() {
        let driver = with_links(FakeDriver::new(), &["A"]);
        let mut job = job(&["A"]);
        job.formatting = Formatting {
            bold: true,
            font_size: Some(FontSize::Px14),
            center: true,
        };
        let (_, driver, _) = run(driver, &job);
        let form = PostingContext::Guest.form();
        for locator in [&form.bold, &form.font_size_menu, &site::font_size(FontSize::Px14)] {
            assert!(driver.calls.contains(&format!("click {}", locator.as_str())));
        }
        assert_eq!(driver.calls_matching("execute ").len(), site::CENTER_ALIGN.len());
        assert!(driver.calls.contains(&"pause 3".to_string()));
    }

    #[test]
    fn no_formatting_touches_no_menus() {
        let driver = with_links(FakeDriver::new(), &["A"]);
        let (_, driver, _) = run(driver, &job(&["A"]));
        let form = PostingContext::Guest.form();
        assert!(!driver.calls.contains(&format!("click {}", form.bold.as_str())));
        assert!(!driver
            .calls
            .contains(&format!("click {}", form.font_size_menu.as_str())));
        assert!(driver.calls_matching("execute ").is_empty());
    }

    #[test]
    fn member_run_returns_to_the_landing_page_and_waits_for_links() {
        let mut driver = with_links(FakeDriver::new(), &["A"]);
        driver.appear_after = Duration::from_secs(1);
        let mut job = job(&["A"]);
        job.login = true;
        let (result, driver, logs) = run(driver, &job);
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
        assert!(errors(&logs).is_empty());
        assert_eq!(
            driver.calls_matching("navigate "),
            vec![
                format!("navigate {BASE}"),
                format!("navigate {BASE}"),
                format!("navigate {BASE}board/A"),
            ]
        );
    }

    #[test]
    fn relative_links_are_resolved_against_the_site() {
        let driver = FakeDriver::new().attribute(
            site::destination_link("A").as_str(),
            "href",
            "/board/lists/?id=a",
        );
        let (result, driver, _) = run(driver, &job(&["A"]));
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
        assert_eq!(
            driver.calls_matching("navigate ").last().copied(),
            Some("navigate https://gall.example.com/board/lists/?id=a")
        );
    }

    #[test]
    fn missing_upload_popup_skips_to_next_attachment() {
        let driver = with_links(FakeDriver::new(), &["A"])
            .missing_window(format!("{BASE}upload/image"));
        let mut job = job(&["A"]);
        job.attachments = vec![
            AttachmentItem::File(PathBuf::from("cat.png")),
            AttachmentItem::File(PathBuf::from("clip.mp4")),
        ];
        let (result, driver, logs) = run(driver, &job);
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
        let errors = errors(&logs);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("failed to upload cat.png: window not found"));
        assert_eq!(driver.calls_matching("file "), vec!["file clip.mp4"]);
        assert_eq!(
            driver.calls_matching("close "),
            vec![format!("close {BASE}upload/image")]
        );
        assert_eq!(
            driver.calls_matching("window "),
            vec![
                "window main".to_string(),
                format!("window {BASE}upload/movie"),
                "window main".to_string(),
            ]
        );
    }

    #[test]
    fn failed_upload_closes_its_popup() {
        let video = UploadTarget::for_kind(AttachmentKind::Video).expect("video target");
        let driver = with_links(FakeDriver::new(), &["A"]).missing(video.done.as_str());
        let mut job = job(&["A"]);
        job.attachments = vec![
            AttachmentItem::File(PathBuf::from("clip.mp4")),
            AttachmentItem::File(PathBuf::from("cat.png")),
        ];
        let (_, driver, _) = run(driver, &job);
        let calls = &driver.calls;
        let close = calls
            .iter()
            .position(|c| *c == format!("close {BASE}upload/movie"))
            .expect("popup should be closed");
        let next = calls
            .iter()
            .position(|c| *c == format!("window {BASE}upload/image"))
            .expect("next upload should open its popup");
        assert!(close < next);
    }

    #[test]
    fn duplicate_destinations_are_posted_once() {
        let driver = with_links(FakeDriver::new(), &["A"]);
        let (result, _, _) = run(driver, &job(&["A", "A"]));
        assert_eq!(result.expect("run should succeed").posted, vec!["A"]);
    }
}
