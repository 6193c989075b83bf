use super::attachments::AttachmentsComponent;
use super::log::LogComponent;
use super::modals::{Action as ModalAction, ModalComponent, PathInputModal, PathTarget};
use super::Component;
use crate::attachment::{AttachmentItem, AttachmentKind};
use crate::config::{Config, FormAction};
use crate::destinations::load_destinations_file;
use crate::form::{Credentials, FontSize, Formatting, PostForm};
use crate::report::{Level, LogEntry, RunEvent};
use crate::types::Action;
use crate::workflow::{self, RunSettings};
use color_eyre::{eyre, Result};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect, Size};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Block;
use ratatui::Frame;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{self, UnboundedSender};
use tui_textarea::TextArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Nickname,
    Password,
    Title,
    Login,
    Center,
    Bold,
    FontSize,
    Attachments,
    Body,
    Destinations,
    Run,
}

impl Focus {
    const ORDER: [Self; 11] = [
        Self::Nickname,
        Self::Password,
        Self::Title,
        Self::Login,
        Self::Center,
        Self::Bold,
        Self::FontSize,
        Self::Attachments,
        Self::Body,
        Self::Destinations,
        Self::Run,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|&f| f == self).unwrap_or_default()
    }
    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }
    fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

fn textarea(title: &'static str, lines: Vec<String>) -> TextArea<'static> {
    let mut textarea = TextArea::new(lines);
    textarea.set_block(Block::bordered().title(title).dim());
    textarea.set_cursor_line_style(Style::default());
    textarea.set_cursor_style(Style::default());
    textarea
}

fn text_of(textarea: &TextArea<'_>) -> String {
    textarea.lines().join("\n")
}

pub struct MainComponent {
    config: Config,
    action_tx: Option<UnboundedSender<Action>>,
    nickname: TextArea<'static>,
    password: TextArea<'static>,
    title: TextArea<'static>,
    body: TextArea<'static>,
    destinations: TextArea<'static>,
    login: bool,
    center: bool,
    bold: bool,
    font_size: Option<FontSize>,
    attachments: AttachmentsComponent,
    log: LogComponent,
    focus: Focus,
    modal: Option<Box<dyn ModalComponent>>,
    running: bool,
}

impl MainComponent {
    pub fn new(config: Config) -> Self {
        let mut password = textarea("Password", Vec::new());
        password.set_mask_char('*');
        Self {
            config,
            action_tx: None,
            nickname: textarea("Nickname (id)", Vec::new()),
            password,
            title: textarea("Title", Vec::new()),
            body: textarea("Body", Vec::new()),
            destinations: textarea("Galleries", Vec::new()),
            login: false,
            center: false,
            bold: false,
            font_size: None,
            attachments: AttachmentsComponent::default(),
            log: LogComponent::default(),
            focus: Focus::Nickname,
            modal: None,
            running: false,
        }
    }
    /// Loads a gallery list file into the destinations field.
    pub fn load_destinations(&mut self, path: &Path) {
        match load_destinations_file(path) {
            Ok(text) => {
                let lines = text.lines().map(str::to_string).collect();
                self.destinations = textarea("Galleries", lines);
                if self.focus == Focus::Destinations {
                    self.update_focus(Focus::Destinations);
                }
                self.info(format!("loaded galleries from {}", path.display()));
            }
            Err(e) => self.error(format!("failed to read {}: {e}", path.display())),
        }
    }
    /// Whether a posting run has been started and has not finished yet.
    pub fn is_running(&self) -> bool {
        self.running
    }
    pub fn form(&self) -> PostForm {
        PostForm {
            credentials: Credentials {
                nickname: text_of(&self.nickname),
                password: text_of(&self.password),
            },
            title: text_of(&self.title),
            body: text_of(&self.body),
            destinations: text_of(&self.destinations),
            formatting: Formatting {
                bold: self.bold,
                font_size: self.font_size,
                center: self.center,
            },
            login: self.login,
        }
    }
    fn info(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry::new(Level::Info, message));
    }
    fn error(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry::new(Level::Error, message));
    }
    fn current_textarea(&mut self) -> Option<&mut TextArea<'static>> {
        match self.focus {
            Focus::Nickname => Some(&mut self.nickname),
            Focus::Password => Some(&mut self.password),
            Focus::Title => Some(&mut self.title),
            Focus::Body => Some(&mut self.body),
            Focus::Destinations => Some(&mut self.destinations),
            _ => None,
        }
    }
    fn update_focus(&mut self, focus: Focus) {
        if let Some(curr) = self.current_textarea() {
            curr.set_cursor_style(Style::default());
            if let Some(block) = curr.block().cloned() {
                curr.set_block(block.dim());
            }
        }
        self.focus = focus;
        if let Some(curr) = self.current_textarea() {
            curr.set_cursor_style(Style::default().reversed());
            if let Some(block) = curr.block().cloned() {
                curr.set_block(block.reset());
            }
        }
        self.attachments.focused = focus == Focus::Attachments;
    }
    fn open_modal(&mut self, target: PathTarget) -> Option<Action> {
        if target == PathTarget::Video && !self.form().accepts_video() {
            self.error("videos can only be added in login mode");
        } else {
            self.modal = Some(Box::new(PathInputModal::new(target)));
        }
        Some(Action::Render)
    }
    fn on_path(&mut self, target: PathTarget, path: PathBuf) {
        match target {
            PathTarget::Image | PathTarget::Video => {
                let item = AttachmentItem::File(path);
                if item.kind() == AttachmentKind::Unknown {
                    self.error(format!("{item}: this format is not supported for posting"));
                }
                self.attachments.append(item);
            }
            PathTarget::TextFile => match fs::read_to_string(&path) {
                Ok(content) => self.attachments.append(AttachmentItem::Text(content)),
                Err(e) => self.error(format!("failed to read {}: {e}", path.display())),
            },
            PathTarget::Destinations => self.load_destinations(&path),
        }
    }
    fn add_body(&mut self) {
        let mut form = self.form();
        if let Some(item) = form.take_body() {
            self.attachments.append(item);
        }
        self.body = textarea("Body", Vec::new());
        if self.focus == Focus::Body {
            self.update_focus(Focus::Body);
        }
    }
    fn start_run(&mut self) -> Result<()> {
        let form = self.form();
        if self.running {
            self.error("a run is already in progress");
            return Ok(());
        }
        if !form.is_ready() {
            self.error("nickname, password, title and galleries are required");
            return Ok(());
        }
        let action_tx = self
            .action_tx
            .clone()
            .ok_or_else(|| eyre::eyre!("action handler not registered"))?;
        let job = form.job(
            self.attachments.list(),
            self.config.destinations.blank_lines,
        );
        self.info(format!(
            "queued {} galleries with {} attachments ({})",
            job.destinations.len(),
            job.attachments.len(),
            self.attachments.summary()
        ));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if let Err(e) = action_tx.send(Action::RunEvent(event)) {
                    return log::error!("failed to forward run event: {e}");
                }
            }
        });
        workflow::spawn(job, RunSettings::from(&self.config), event_tx);
        self.running = true;
        Ok(())
    }
    fn on_run_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Log(entry) => self.log.push(entry),
            RunEvent::Finished(result) => {
                self.running = false;
                match result {
                    Ok(summary) => self.info(format!("finished: {summary}")),
                    Err(_) => self.info("finished with errors"),
                }
            }
        }
    }
    fn toggle(&mut self) -> bool {
        match self.focus {
            Focus::Login => self.login = !self.login,
            Focus::Center => self.center = !self.center,
            Focus::Bold => self.bold = !self.bold,
            Focus::FontSize => self.font_size = FontSize::cycle(self.font_size),
            _ => return false,
        }
        true
    }
    fn options_line(&self) -> Line<'static> {
        let check = |b: bool| if b { "[x]" } else { "[ ]" };
        let items = [
            (Focus::Login, format!("{} Login", check(self.login))),
            (Focus::Center, format!("{} Center", check(self.center))),
            (Focus::Bold, format!("{} Bold", check(self.bold))),
            (
                Focus::FontSize,
                format!(
                    "Font size: {}",
                    self.font_size.map_or("-".to_string(), |s| s.to_string())
                ),
            ),
        ];
        let mut spans = Vec::new();
        for (focus, label) in items {
            let span = Span::from(label);
            spans.push(if self.focus == focus { span.reversed() } else { span });
            spans.push(Span::from("  "));
        }
        Line::from(spans)
    }
    fn run_line(&self) -> Line<'static> {
        let mut line = if self.running {
            Line::from("Running...").centered().dim()
        } else if self.form().is_ready() {
            Line::from("Run").centered().blue()
        } else {
            Line::from("Run").centered().dim()
        };
        if self.focus == Focus::Run {
            line = line.reversed();
        }
        line
    }
}

impl Component for MainComponent {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(tx);
        Ok(())
    }
    fn init(&mut self, _size: Size) -> Result<()> {
        self.update_focus(Focus::Nickname);
        Ok(())
    }
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(modal) = self.modal.as_mut() {
            return Ok(match modal.handle_key_events(key)? {
                Some(ModalAction::Ok(target, path)) => {
                    self.modal = None;
                    self.on_path(target, path);
                    Some(Action::Render)
                }
                Some(ModalAction::Cancel) => {
                    self.modal = None;
                    Some(Action::Render)
                }
                Some(ModalAction::Render) => Some(Action::Render),
                None => None,
            });
        }
        if let Some(action) = self.config.keybindings.form.get(&key.into()) {
            return Ok(Some(Action::Form(*action)));
        }
        match key.code {
            KeyCode::Tab => return Ok(Some(Action::NextFocus)),
            KeyCode::BackTab => return Ok(Some(Action::PrevFocus)),
            _ => {}
        }
        match self.focus {
            Focus::Nickname | Focus::Password | Focus::Title if key.code == KeyCode::Enter => {
                Ok(Some(Action::NextFocus))
            }
            Focus::Login | Focus::Center | Focus::Bold | Focus::FontSize => {
                Ok(match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Right if self.toggle() => {
                        Some(Action::Render)
                    }
                    _ => None,
                })
            }
            Focus::Attachments => self.attachments.handle_key_events(key),
            Focus::Run if key.code == KeyCode::Enter => Ok(Some(Action::Run)),
            _ => {
                let Some(textarea) = self.current_textarea() else {
                    return Ok(None);
                };
                let cursor = textarea.cursor();
                Ok(if textarea.input(key) || textarea.cursor() != cursor {
                    Some(Action::Render)
                } else {
                    None
                })
            }
        }
    }
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        Ok(match action {
            Action::NextFocus => {
                self.update_focus(self.focus.next());
                Some(Action::Render)
            }
            Action::PrevFocus => {
                self.update_focus(self.focus.prev());
                Some(Action::Render)
            }
            Action::Form(action) => match action {
                FormAction::MoveUp | FormAction::MoveDown | FormAction::Delete => {
                    self.attachments.apply(action).then_some(Action::Render)
                }
                FormAction::AddImage => self.open_modal(PathTarget::Image),
                FormAction::AddVideo => self.open_modal(PathTarget::Video),
                FormAction::AddTextFile => self.open_modal(PathTarget::TextFile),
                FormAction::LoadDestinations => self.open_modal(PathTarget::Destinations),
                FormAction::AddBody => {
                    self.add_body();
                    Some(Action::Render)
                }
            },
            Action::Run => {
                self.start_run()?;
                Some(Action::Render)
            }
            Action::RunEvent(event) => {
                self.on_run_event(event);
                Some(Action::Render)
            }
            _ => None,
        })
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let [nickname, password, title, options, attachments, body, run, status] =
            Layout::vertical([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(6),
                Constraint::Length(1),
                Constraint::Length(u16::from(self.config.dev)),
            ])
            .areas(left);
        let [destinations, log] =
            Layout::vertical([Constraint::Length(10), Constraint::Min(3)]).areas(right);

        f.render_widget(&self.nickname, nickname);
        f.render_widget(&self.password, password);
        f.render_widget(&self.title, title);
        f.render_widget(self.options_line(), options);
        self.attachments.draw(f, attachments)?;
        f.render_widget(&self.body, body);
        f.render_widget(self.run_line(), run);
        if self.config.dev {
            f.render_widget(
                Line::from(format!("{:?} | {}", self.focus, self.attachments.summary())).dim(),
                status,
            );
        }
        f.render_widget(&self.destinations, destinations);
        self.log.draw(f, log)?;

        if let Some(modal) = self.modal.as_mut() {
            modal.draw(f, area)?;
        }
        Ok(())
    }
}
