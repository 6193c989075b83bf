use super::{Action, ModalComponent};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use image::ImageReader;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear};
use ratatui::Frame;
use std::path::{Path, PathBuf};
use tui_textarea::TextArea;

/// What the entered path is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTarget {
    Image,
    Video,
    TextFile,
    Destinations,
}

impl PathTarget {
    fn title(self) -> &'static str {
        match self {
            Self::Image => "Add image (.jpg, .png)",
            Self::Video => "Add video (.mp4, .avi, .mov, .webm)",
            Self::TextFile => "Add text file (.txt)",
            Self::Destinations => "Load gallery list (.txt)",
        }
    }
    fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Image => &["jpg", "png"],
            Self::Video => &["mp4", "avi", "mov", "webm"],
            Self::TextFile | Self::Destinations => &["txt"],
        }
    }
    /// Whether `path` is an existing file this target can use. Images must also
    /// carry a readable image header.
    pub fn accepts(self, path: &Path) -> bool {
        let extension_ok = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext));
        if !extension_ok || !path.is_file() {
            return false;
        }
        match self {
            Self::Image => ImageReader::open(path)
                .ok()
                .and_then(|reader| reader.with_guessed_format().ok())
                .and_then(|reader| reader.into_dimensions().ok())
                .is_some(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Ok,
    Error,
}

pub struct PathInputModal {
    target: PathTarget,
    path: TextArea<'static>,
    state: State,
}

impl PathInputModal {
    pub fn new(target: PathTarget) -> Self {
        let mut path = TextArea::default();
        path.set_block(Block::bordered().title("Path"));
        path.set_cursor_line_style(Style::default());
        path.set_cursor_style(Style::default().reversed());
        Self {
            target,
            path,
            state: State::None,
        }
    }
    fn current_path(&self) -> PathBuf {
        PathBuf::from(self.path.lines().join("").trim())
    }
    fn validate(&mut self) {
        let path = self.current_path();
        self.state = if path.as_os_str().is_empty() {
            State::None
        } else if self.target.accepts(&path) {
            State::Ok
        } else {
            State::Error
        };
        if let Some(block) = self.path.block() {
            let block = block.clone();
            self.path.set_block(match self.state {
                State::None => block.border_style(Color::Reset),
                State::Ok => block.border_style(Color::Green),
                State::Error => block.border_style(Color::Red),
            });
        }
    }
}

impl ModalComponent for PathInputModal {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return Ok(Some(Action::Cancel)),
            (KeyCode::Enter, _) | (KeyCode::Char('m'), KeyModifiers::CONTROL) => {
                return Ok(match self.state {
                    State::Ok => Some(Action::Ok(self.target, self.current_path())),
                    _ => None,
                });
            }
            _ => {}
        }
        let cursor = self.path.cursor();
        Ok(if self.path.input(key) {
            self.validate();
            Some(Action::Render)
        } else if self.path.cursor() != cursor {
            Some(Action::Render)
        } else {
            None
        })
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let area = area.inner(Margin {
            horizontal: 2,
            vertical: 1,
        });
        let [area] = Layout::vertical([Constraint::Length(6)]).areas(area);

        let block = Block::bordered().title(self.target.title());
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let [path, ok] = Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).areas(inner);
        let mut line = Line::from("Enter: OK  Esc: Cancel").centered();
        line = if self.state == State::Ok {
            line.blue()
        } else {
            line.dim()
        };
        f.render_widget(&self.path, path);
        f.render_widget(line, ok);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use std::fs;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn type_str(modal: &mut PathInputModal, s: &str) {
        for c in s.chars() {
            modal
                .handle_key_events(key(KeyCode::Char(c)))
                .expect("key handling failed");
        }
    }

    #[test]
    fn accepts_existing_files_with_matching_extension() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let txt = dir.path().join("list.txt");
        fs::write(&txt, "A\nB").expect("failed to write file");
        let fake_png = dir.path().join("broken.png");
        fs::write(&fake_png, "not an image").expect("failed to write file");
        let mov = dir.path().join("clip.mov");
        fs::write(&mov, "").expect("failed to write file");

        assert!(PathTarget::Destinations.accepts(&txt));
        assert!(PathTarget::TextFile.accepts(&txt));
        assert!(!PathTarget::Image.accepts(&txt));
        assert!(!PathTarget::Image.accepts(&fake_png));
        assert!(PathTarget::Video.accepts(&mov));
        assert!(!PathTarget::Video.accepts(&dir.path().join("missing.mp4")));
    }

    #[test]
    fn enter_only_confirms_valid_paths() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let txt = dir.path().join("list.txt");
        fs::write(&txt, "A").expect("failed to write file");

        let mut modal = PathInputModal::new(PathTarget::Destinations);
        type_str(&mut modal, "/definitely/missing.txt");
        assert_eq!(
            modal.handle_key_events(key(KeyCode::Enter)).expect("enter"),
            None
        );

        let mut modal = PathInputModal::new(PathTarget::Destinations);
        type_str(&mut modal, &txt.display().to_string());
        assert_eq!(
            modal.handle_key_events(key(KeyCode::Enter)).expect("enter"),
            Some(Action::Ok(PathTarget::Destinations, txt))
        );
        assert_eq!(
            modal.handle_key_events(key(KeyCode::Esc)).expect("esc"),
            Some(Action::Cancel)
        );
    }
}
