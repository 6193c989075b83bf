use super::Component;
use crate::attachment::{AttachmentItem, AttachmentKind, AttachmentList};
use crate::config::FormAction;
use crate::types::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, List, ListState};
use ratatui::Frame;

/// The attachment list as shown in the form. Selection lives in the list model;
/// the widget state is rebuilt from it on every draw.
#[derive(Default)]
pub struct AttachmentsComponent {
    list: AttachmentList,
    state: ListState,
    pub focused: bool,
}

impl AttachmentsComponent {
    pub fn list(&self) -> &AttachmentList {
        &self.list
    }
    pub fn append(&mut self, item: AttachmentItem) {
        self.list.append(item);
    }
    /// Applies a list editing action. Returns whether anything changed.
    pub fn apply(&mut self, action: FormAction) -> bool {
        match action {
            FormAction::MoveUp => self.list.move_selected_up().is_some(),
            FormAction::MoveDown => self.list.move_selected_down().is_some(),
            FormAction::Delete => self.list.delete_selected().is_some(),
            _ => false,
        }
    }
    pub fn summary(&self) -> String {
        format!(
            "{} images, {} videos, {} texts, {} unknown",
            self.list.count(AttachmentKind::Image),
            self.list.count(AttachmentKind::Video),
            self.list.count(AttachmentKind::Text),
            self.list.count(AttachmentKind::Unknown),
        )
    }
}

impl Component for AttachmentsComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Up => self.list.select_prev(),
            KeyCode::Down => self.list.select_next(),
            KeyCode::Delete => {
                self.apply(FormAction::Delete);
            }
            _ => return Ok(None),
        }
        Ok(Some(Action::Render))
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(format!("Attachments ({})", self.list.len()));
        block = if self.focused {
            block.border_style(Color::Yellow)
        } else {
            block.dim()
        };
        let items = self
            .list
            .items()
            .zip(self.list.labels())
            .map(|(item, label)| {
                let line = Line::from(format!("{:<7} {label}", item.kind()));
                if item.kind() == AttachmentKind::Unknown {
                    line.red()
                } else {
                    line
                }
            })
            .collect::<Vec<_>>();
        self.state.select(self.list.selected());
        f.render_stateful_widget(
            List::new(items)
                .block(block)
                .highlight_style(Style::default().reversed()),
            area,
            &mut self.state,
        );
        Ok(())
    }
}
