//! Page locators and URLs of the gallery site. These follow the site's markup and
//! have to be updated whenever the site changes it.

use crate::attachment::AttachmentKind;
use crate::driver::{xpath_literal, Locator};
use crate::form::FontSize;

const fn xp(xpath: &'static str) -> Locator {
    Locator::xpath_static(xpath)
}

pub const DEFAULT_BASE_URL: &str = "https://gall.dcinside.com/";

pub const LOGIN_LINK: Locator = xp("/html/body/div[2]/header/div/div[2]/ul/li[10]/a");
pub const LOGIN_ID: Locator =
    xp("/html/body/div[2]/main/div/article/section/div/div[1]/div/form/fieldset/div[1]/input[1]");
pub const LOGIN_PASSWORD: Locator =
    xp("/html/body/div[2]/main/div/article/section/div/div[1]/div/form/fieldset/div[1]/input[2]");
pub const LOGIN_SUBMIT: Locator =
    xp("/html/body/div[2]/main/div/article/section/div/div[1]/div/form/fieldset/button");

pub const WRITE_BUTTON: Locator =
    xp("/html/body/div[2]/div[3]/main/section[1]/article[2]/div[3]/div[2]/button");

pub const GUEST_SAVED_NICKNAME: Locator =
    xp("/html/body/div[2]/main/section/article[2]/form/div[1]/fieldset/div[1]/input[1]");
pub const GUEST_CLEAR_NICKNAME: Locator =
    xp("/html/body/div[2]/main/section/article[2]/form/div[1]/fieldset/div[1]/button[1]");
pub const GUEST_NICKNAME: Locator =
    xp("/html/body/div[2]/main/section/article[2]/form/div[1]/fieldset/div[1]/input[2]");
pub const GUEST_PASSWORD: Locator =
    xp("/html/body/div[2]/main/section/article[2]/form/div[1]/fieldset/div[2]/input");
pub const GUEST_TITLE: Locator =
    xp("/html/body/div[2]/main/section/article[2]/form/div[1]/fieldset/div[3]/input");
pub const MEMBER_TITLE: Locator = xp(r#"//*[@id="subject"]"#);

pub const EDITOR_FRAME: &str = "tx_canvas_wysiwyg";
pub const EDITOR_BODY: Locator = xp("/html/body");
pub const FILE_INPUT: Locator = xp(r#"//input[@type="file"]"#);

/// `(css selector, script)` pairs that center the content of the editor. The
/// script sees the matched element as `el`.
pub const CENTER_ALIGN: [(&str, &str); 3] = [
    ("img.txc-image", "el.parentNode.style.textAlign = 'center';"),
    (
        ".video_inbox .dc_movie_thumbox",
        "el.parentNode.style.textAlign = 'center';",
    ),
    ("p", "el.style.textAlign = 'center';"),
];

/// Editor controls whose position depends on the posting context.
#[derive(Debug)]
pub struct FormLocators {
    pub bold: Locator,
    pub font_size_menu: Locator,
    pub submit: Locator,
}

static GUEST_FORM: FormLocators = FormLocators {
    bold: xp("/html/body/div[2]/main/section/article[2]/form/div[3]/div/div[2]/div/ul[3]/li[1]/div/a"),
    font_size_menu: xp(
        "/html/body/div[2]/main/section/article[2]/form/div[3]/div/div[2]/div/ul[2]/li/div[1]/a",
    ),
    submit: xp(r#"//*[@id="write"]/div[5]/button[2]"#),
};

static MEMBER_FORM: FormLocators = FormLocators {
    bold: xp("/html/body/div[2]/main/section/article[2]/form/div[4]/div/div[2]/div/ul[3]/li[1]/div/a"),
    font_size_menu: xp(
        "/html/body/div[2]/main/section/article[2]/form/div[4]/div/div[2]/div/ul[2]/li/div[1]/a",
    ),
    submit: xp("/html/body/div[2]/main/section/article[2]/form/div[6]/button[2]"),
};

/// Guests fill in a nickname and password on every post; members only a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingContext {
    Guest,
    Member,
}

impl PostingContext {
    pub fn new(login: bool) -> Self {
        if login {
            Self::Member
        } else {
            Self::Guest
        }
    }
    pub fn form(self) -> &'static FormLocators {
        match self {
            Self::Guest => &GUEST_FORM,
            Self::Member => &MEMBER_FORM,
        }
    }
    pub fn title(self) -> Locator {
        match self {
            Self::Guest => GUEST_TITLE,
            Self::Member => MEMBER_TITLE,
        }
    }
}

pub fn destination_link(name: &str) -> Locator {
    Locator::xpath(format!("//li/a[text()={}]", xpath_literal(name)))
}

/// Resolves a link found on the site against `base_url`. Absolute URLs are kept.
pub fn absolute_url(base_url: &str, href: &str) -> String {
    if href.contains("://") {
        return href.to_string();
    }
    let (scheme, rest) = base_url.split_once("://").unwrap_or(("https", base_url));
    if let Some(host_relative) = href.strip_prefix("//") {
        return format!("{scheme}://{host_relative}");
    }
    let origin = rest.split('/').next().unwrap_or_default();
    if href.starts_with('/') {
        format!("{scheme}://{origin}{href}")
    } else {
        format!("{}/{href}", base_url.trim_end_matches('/'))
    }
}

pub fn font_size(size: FontSize) -> Locator {
    Locator::xpath(format!(
        r#"//*[@id="tx_fontsize_menu"]/ul/li[{}]/a"#,
        size.position()
    ))
}

/// Where and how one kind of media is uploaded through the editor's popup.
#[derive(Debug)]
pub struct UploadTarget {
    pub entry: Locator,
    pub popup_path: &'static str,
    pub done: Locator,
    pub confirm: Locator,
}

static IMAGE_UPLOAD: UploadTarget = UploadTarget {
    entry: xp(r#"//*[@id="tx_image"]/a"#),
    popup_path: "upload/image",
    done: xp(r#"//*[@id="sortable"]/li[1]/img"#),
    confirm: xp("/html/body/div[1]/div/div[2]/button"),
};

static VIDEO_UPLOAD: UploadTarget = UploadTarget {
    entry: xp(r#"//*[@id="tx_movie"]/a"#),
    popup_path: "upload/movie",
    done: xp(r#"//*[@id="movie_tmp"]/div/div[2]/div[1]/div[1]/img"#),
    confirm: xp(r#"//*[@id="movie_tmp"]/div/div[3]/button"#),
};

impl UploadTarget {
    pub fn for_kind(kind: AttachmentKind) -> Option<&'static Self> {
        match kind {
            AttachmentKind::Image => Some(&IMAGE_UPLOAD),
            AttachmentKind::Video => Some(&VIDEO_UPLOAD),
            AttachmentKind::Text | AttachmentKind::Unknown => None,
        }
    }
    pub fn popup_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.popup_path)
    }
}
