use crate::config::FormAction;
use crate::report::RunEvent;
use crossterm::event::{KeyEvent, MouseEvent};

#[derive(Debug, Clone)]
pub enum Action {
    Error(String),
    Quit,
    Tick(usize),
    Render,
    NextFocus,
    PrevFocus,
    Run,
    Form(FormAction),
    RunEvent(RunEvent),
}

#[derive(Debug, Clone)]
pub enum Event {
    Tick(usize),
    Render,
    Key(KeyEvent),
    Mouse(MouseEvent),
    Error(String),
}
