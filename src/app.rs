use crate::components::main::MainComponent;
use crate::components::Component;
use crate::config::Config;
use crate::tui::{io, Tui};
use crate::types::{Action, Event};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub struct App {
    config: Config,
    destinations: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config) -> Self {
        log::debug!("App::new({config:?})");
        Self {
            config,
            destinations: None,
        }
    }
    /// Gallery list file to load into the form on startup.
    pub fn with_destinations(mut self, path: Option<PathBuf>) -> Self {
        self.destinations = path;
        self
    }
    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        let terminal = Terminal::new(CrosstermBackend::new(io()))?;
        log::debug!("terminal size: {}", terminal.size()?);
        let mut tui = Tui::new(terminal);
        tui.start(if self.config.dev { 10.0 } else { 4.0 })?;

        let mut main_component = MainComponent::new(self.config.clone());
        main_component.register_action_handler(action_tx.clone())?;
        main_component.init(tui.size()?)?;
        if let Some(path) = &self.destinations {
            main_component.load_destinations(path);
        }

        let mut should_quit = false;
        loop {
            if let Some(e) = tui.next_event().await {
                if let Some(action) = self.handle_events(e.clone()) {
                    action_tx.send(action)?;
                } else if let Some(action) = main_component.handle_events(Some(e))? {
                    action_tx.send(action)?;
                }
            }
            while let Ok(action) = action_rx.try_recv() {
                if !matches!(action, Action::Tick(_) | Action::Render | Action::RunEvent(_)) {
                    log::info!("Action {action:?}");
                }
                match action {
                    Action::Quit => should_quit = true,
                    Action::Tick(_) => {}
                    Action::Error(e) => log::error!("{e}"),
                    Action::Render => {
                        tui.draw(|f| {
                            if let Err(e) = main_component.draw(f, f.area()) {
                                if let Err(e) =
                                    action_tx.send(Action::Error(format!("failed to draw: {e:?}")))
                                {
                                    log::error!("failed to send error: {e}");
                                }
                            }
                        })?;
                    }
                    _ => {
                        if let Some(action) = main_component.update(action)? {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            if should_quit {
                break;
            }
        }
        tui.end()?;
        if let Some(notice) = exit_notice(main_component.is_running()) {
            log::warn!("{notice}");
            eprintln!("{notice}");
        }
        Ok(())
    }
    fn handle_events(&mut self, event: Event) -> Option<Action> {
        match event {
            Event::Tick(i) => Some(Action::Tick(i)),
            Event::Render => Some(Action::Render),
            Event::Key(key_event) => self.handle_key_events(key_event),
            _ => None,
        }
    }
    /// Global bindings take precedence over the focused widget.
    fn handle_key_events(&mut self, key_event: KeyEvent) -> Option<Action> {
        if let Some(action) = self.config.keybindings.global.get(&key_event.into()) {
            return Some(action.into());
        }
        if key_event.code == KeyCode::Char('q') && key_event.modifiers == KeyModifiers::CONTROL {
            return Some(Action::Quit);
        }
        None
    }
}

/// The browser worker cannot be cancelled, so the process only exits once an
/// active run has finished.
fn exit_notice(running: bool) -> Option<&'static str> {
    running.then_some("waiting for the current run to finish before exiting...")
}
