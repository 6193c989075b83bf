use super::Component;
use crate::report::{Level, LogEntry};
use color_eyre::Result;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

/// Append-only run log. Errors are red, successes green.
#[derive(Default)]
pub struct LogComponent {
    entries: Vec<LogEntry>,
}

impl LogComponent {
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            let style = match entry.level {
                Level::Error => Style::default().fg(Color::Red),
                Level::Success => Style::default().fg(Color::Green),
                Level::Info => Style::default(),
            };
            for line in textwrap::wrap(&entry.to_string(), width.max(1)) {
                lines.push(Line::styled(line.into_owned(), style));
            }
        }
        lines
    }
}

impl Component for LogComponent {
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let block = Block::bordered().title("Log");
        let inner = block.inner(area);
        let lines = self.lines(usize::from(inner.width));
        // keep the newest entries in view
        let skip = lines.len().saturating_sub(usize::from(inner.height));
        f.render_widget(
            Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>()).block(block),
            area,
        );
        Ok(())
    }
}
