mod path_input;

pub use self::path_input::{PathInputModal, PathTarget};
use {
    color_eyre::Result,
    crossterm::event::KeyEvent,
    ratatui::{layout::Rect, Frame},
    std::path::PathBuf,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ok(PathTarget, PathBuf),
    Cancel,
    Render,
}

pub trait ModalComponent {
    #[allow(unused_variables)]
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()>;
}
