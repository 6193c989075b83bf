use crate::attachment::{AttachmentItem, AttachmentList};
use crate::destinations::{parse_destinations, BlankLinePolicy};
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontSize {
    Px8,
    Px9,
    Px10,
    Px11,
    Px12,
    Px14,
    Px18,
    Px24,
    Px36,
}

impl FontSize {
    pub const ALL: [Self; 9] = [
        Self::Px8,
        Self::Px9,
        Self::Px10,
        Self::Px11,
        Self::Px12,
        Self::Px14,
        Self::Px18,
        Self::Px24,
        Self::Px36,
    ];

    pub fn px(self) -> u8 {
        match self {
            Self::Px8 => 8,
            Self::Px9 => 9,
            Self::Px10 => 10,
            Self::Px11 => 11,
            Self::Px12 => 12,
            Self::Px14 => 14,
            Self::Px18 => 18,
            Self::Px24 => 24,
            Self::Px36 => 36,
        }
    }
    /// 1-based position in the editor's font size menu.
    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|&size| size == self)
            .map_or(1, |i| i + 1)
    }
    /// Cycles `None → 8px → … → 36px → None`.
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::ALL[0]),
            Some(size) => Self::ALL.get(size.position()).copied(),
        }
    }
}

impl Display for FontSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.px())
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let px = s
            .trim()
            .trim_end_matches("px")
            .parse::<u8>()
            .map_err(|e| format!("invalid font size {s:?}: {e}"))?;
        Self::ALL
            .into_iter()
            .find(|size| size.px() == px)
            .ok_or_else(|| format!("unsupported font size: {px}px"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatting {
    pub bold: bool,
    pub font_size: Option<FontSize>,
    pub center: bool,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub nickname: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("nickname", &self.nickname)
            .field("password", &"********")
            .finish()
    }
}

/// Everything the form holds at the moment the user asks for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub credentials: Credentials,
    pub title: String,
    pub body: String,
    pub destinations: String,
    pub formatting: Formatting,
    pub login: bool,
}

impl PostForm {
    /// A run needs credentials, a title and at least one destination line.
    pub fn is_ready(&self) -> bool {
        [
            &self.credentials.nickname,
            &self.credentials.password,
            &self.title,
            &self.destinations,
        ]
        .iter()
        .all(|s| !s.trim().is_empty())
    }
    /// Videos can only be embedded by signed-in members.
    pub fn accepts_video(&self) -> bool {
        self.login
    }
    /// Takes the body as an inline text attachment. Returns `None` for an empty body.
    /// The body is cleared either way.
    pub fn take_body(&mut self) -> Option<AttachmentItem> {
        let body = std::mem::take(&mut self.body);
        (!body.is_empty()).then_some(AttachmentItem::Text(body))
    }
    pub fn job(&self, attachments: &AttachmentList, policy: BlankLinePolicy) -> PostJob {
        PostJob {
            credentials: self.credentials.clone(),
            title: self.title.clone(),
            formatting: self.formatting,
            login: self.login,
            attachments: attachments.to_vec(),
            destinations: parse_destinations(&self.destinations, policy),
        }
    }
}

/// An owned snapshot handed to the worker. The UI keeps its own list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostJob {
    pub credentials: Credentials,
    pub title: String,
    pub formatting: Formatting,
    pub login: bool,
    pub attachments: Vec<AttachmentItem>,
    pub destinations: Vec<String>,
}
