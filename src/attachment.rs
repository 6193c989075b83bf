use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LABEL_LEN: usize = 8;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Video,
    Text,
    Unknown,
}

impl AttachmentKind {
    /// Derives the kind from the file extension. Never fails: anything outside the
    /// supported set is `Unknown`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(OsStr::to_str) {
            Some("jpg" | "png") => Self::Image,
            Some("mp4") => Self::Video,
            Some("txt") => Self::Text,
            _ => Self::Unknown,
        }
    }
}

impl Display for AttachmentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Text => "text",
            Self::Unknown => "unknown",
        })
    }
}

/// A unit of content queued for a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentItem {
    File(PathBuf),
    Text(String),
}

impl AttachmentItem {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Self::File(path) => AttachmentKind::from_path(path),
            Self::Text(_) => AttachmentKind::Text,
        }
    }
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Text(_) => None,
        }
    }
    /// Text to insert into the editor for text-kinded items. Path-backed `.txt`
    /// files are read when asked.
    pub fn text_content(&self) -> io::Result<Option<String>> {
        match self {
            Self::Text(content) => Ok(Some(content.clone())),
            Self::File(path) if self.kind() == AttachmentKind::Text => {
                fs::read_to_string(path).map(Some)
            }
            Self::File(_) => Ok(None),
        }
    }
    /// Short form of the item's textual representation.
    pub fn label(&self) -> String {
        short_label(&self.to_string())
    }
    fn list_label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Text(content) => short_label(content),
        }
    }
}

impl Display for AttachmentItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Text(content) => f.write_str(content),
        }
    }
}

pub fn short_label(s: &str) -> String {
    match s.char_indices().nth(LABEL_LEN) {
        Some((end, _)) => format!("{}{ELLIPSIS}", &s[..end]),
        None => s.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    item: AttachmentItem,
    label: String,
}

/// Ordered attachments together with their display labels. Insertion order is
/// posting order, and each item is stored with its label so the two can never
/// drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentList {
    entries: Vec<Entry>,
    selected: Option<usize>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn append(&mut self, item: AttachmentItem) {
        let label = item.list_label();
        log::debug!("append {} attachment: {label}", item.kind());
        self.entries.push(Entry { item, label });
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&AttachmentItem> {
        self.entries.get(index).map(|e| &e.item)
    }
    pub fn items(&self) -> impl Iterator<Item = &AttachmentItem> {
        self.entries.iter().map(|e| &e.item)
    }
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
    pub fn to_vec(&self) -> Vec<AttachmentItem> {
        self.items().cloned().collect()
    }
    pub fn count(&self, kind: AttachmentKind) -> usize {
        self.items().filter(|item| item.kind() == kind).count()
    }
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.entries.len());
    }
    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(self.len() - 1)));
    }
    pub fn select_prev(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = Some(self.selected.map_or(0, |i| i.saturating_sub(1)));
    }
    /// Swaps the item at `index` with its predecessor and moves the selection with
    /// it. Returns the new index, or `None` when nothing moved.
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.entries.len() {
            return None;
        }
        self.entries.swap(index, index - 1);
        self.selected = Some(index - 1);
        Some(index - 1)
    }
    /// Swaps the item at `index` with its successor and moves the selection with
    /// it. Returns the new index, or `None` when nothing moved.
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.entries.len() {
            return None;
        }
        self.entries.swap(index, index + 1);
        self.selected = Some(index + 1);
        Some(index + 1)
    }
    pub fn move_selected_up(&mut self) -> Option<usize> {
        self.selected.and_then(|i| self.move_up(i))
    }
    pub fn move_selected_down(&mut self) -> Option<usize> {
        self.selected.and_then(|i| self.move_down(i))
    }
    /// Removes the selected item. Does nothing without a selection.
    pub fn delete_selected(&mut self) -> Option<AttachmentItem> {
        let index = self.selected?;
        let removed = self.entries.remove(index);
        self.selected = match self.entries.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
        Some(removed.item)
    }
}
