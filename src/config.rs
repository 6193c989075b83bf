use crate::destinations::BlankLinePolicy;
use crate::site::DEFAULT_BASE_URL;
use crate::types::Action as AppAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub destinations: DestinationsConfig,
    #[serde(default)]
    pub dev: bool,
}

impl Config {
    /// Fills in bindings for actions the user has not bound.
    pub fn set_default_keybindings(&mut self) {
        let ctrl = |c| Key(KeyCode::Char(c), Some(KeyModifiers::CONTROL));
        for (key, action) in [
            (ctrl('c'), GlobalAction::Quit),
            (ctrl('r'), GlobalAction::Run),
            (ctrl('n'), GlobalAction::NextFocus),
            (ctrl('p'), GlobalAction::PrevFocus),
        ] {
            if !self.keybindings.global.values().any(|a| *a == action) {
                self.keybindings.global.insert(key, action);
            }
        }
        for (key, action) in [
            (ctrl('u'), FormAction::MoveUp),
            (ctrl('d'), FormAction::MoveDown),
            (ctrl('x'), FormAction::Delete),
            (ctrl('g'), FormAction::AddImage),
            (ctrl('v'), FormAction::AddVideo),
            (ctrl('t'), FormAction::AddTextFile),
            (ctrl('b'), FormAction::AddBody),
            (ctrl('l'), FormAction::LoadDestinations),
        ] {
            if !self.keybindings.form.values().any(|a| *a == action) {
                self.keybindings.form.entry(key).or_insert(action);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Keybindings {
    #[serde(default)]
    pub global: HashMap<Key, GlobalAction>,
    #[serde(default)]
    pub form: HashMap<Key, FormAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: 1280,
            window_height: 1024,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// All values are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timeouts {
    pub element: u64,
    pub login: u64,
    pub image_upload: u64,
    pub video_upload: u64,
    pub settle: u64,
    pub click_delay: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element: 10,
            login: 3,
            image_upload: 10,
            video_upload: 50,
            settle: 3,
            click_delay: 1,
        }
    }
}

impl Timeouts {
    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element)
    }
    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login)
    }
    pub fn image_upload(&self) -> Duration {
        Duration::from_secs(self.image_upload)
    }
    pub fn video_upload(&self) -> Duration {
        Duration::from_secs(self.video_upload)
    }
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle)
    }
    pub fn click_delay(&self) -> Duration {
        Duration::from_secs(self.click_delay)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DestinationsConfig {
    pub blank_lines: BlankLinePolicy,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Key(KeyCode, Option<KeyModifiers>);

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        Self(
            event.code,
            match event.modifiers {
                KeyModifiers::CONTROL | KeyModifiers::SHIFT => Some(event.modifiers),
                _ => None,
            },
        )
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            KeyCode::Char(c) => match self.1 {
                Some(modifier) => {
                    let modifier = match modifier {
                        KeyModifiers::CONTROL => "Ctrl",
                        KeyModifiers::SHIFT => "Shift",
                        _ => return Err(serde::ser::Error::custom("invalid key modifier")),
                    };
                    format!("{modifier}-{c}").serialize(serializer)
                }
                None => c.to_string().serialize(serializer),
            },
            _ => Err(serde::ser::Error::custom("invalid key code")),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (modifier, code) = match s.split_once('-') {
            Some((modifier, code)) if !code.is_empty() => (
                Some(match modifier {
                    "Ctrl" => KeyModifiers::CONTROL,
                    "Shift" => KeyModifiers::SHIFT,
                    _ => return Err(serde::de::Error::custom("invalid key modifier")),
                }),
                code,
            ),
            _ => (None, s.as_str()),
        };
        let mut chars = code.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            Ok(Self(KeyCode::Char(c), modifier))
        } else {
            Err(serde::de::Error::custom("invalid key"))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlobalAction {
    NextFocus,
    PrevFocus,
    Run,
    Quit,
}

impl From<&GlobalAction> for AppAction {
    fn from(action: &GlobalAction) -> Self {
        match action {
            GlobalAction::NextFocus => AppAction::NextFocus,
            GlobalAction::PrevFocus => AppAction::PrevFocus,
            GlobalAction::Run => AppAction::Run,
            GlobalAction::Quit => AppAction::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FormAction {
    MoveUp,
    MoveDown,
    Delete,
    AddImage,
    AddVideo,
    AddTextFile,
    AddBody,
    LoadDestinations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let config = toml::from_str::<Config>("").expect("failed to deserialize config");
        assert_eq!(config, Config::default());
        assert_eq!(config.timeouts.element(), Duration::from_secs(10));
        assert_eq!(config.timeouts.video_upload(), Duration::from_secs(50));
        assert_eq!(config.site.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.destinations.blank_lines, BlankLinePolicy::Stop);
    }

    #[test]
    fn deserialize() {
        let input = r#"
[keybindings.global]
Ctrl-c = "Quit"
"?" = "Run"

[keybindings.form]
Ctrl-k = "MoveUp"

[browser]
headless = true

[timeouts]
video_upload = 120

[destinations]
blank_lines = "skip"
"#;
        let config = toml::from_str::<Config>(input).expect("failed to deserialize config");
        assert_eq!(
            config,
            Config {
                keybindings: Keybindings {
                    global: HashMap::from_iter([
                        (
                            Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL)),
                            GlobalAction::Quit
                        ),
                        (Key(KeyCode::Char('?'), None), GlobalAction::Run)
                    ]),
                    form: HashMap::from_iter([(
                        Key(KeyCode::Char('k'), Some(KeyModifiers::CONTROL)),
                        FormAction::MoveUp
                    )]),
                },
                browser: BrowserConfig {
                    headless: true,
                    ..Default::default()
                },
                timeouts: Timeouts {
                    video_upload: 120,
                    ..Default::default()
                },
                destinations: DestinationsConfig {
                    blank_lines: BlankLinePolicy::Skip,
                },
                ..Default::default()
            }
        )
    }

    #[test]
    fn deserialize_minus_key() {
        let key = toml::from_str::<HashMap<String, Key>>(r#"k = "-""#).expect("failed to parse");
        assert_eq!(key["k"], Key(KeyCode::Char('-'), None));
        assert!(toml::from_str::<HashMap<String, Key>>(r#"k = "Alt-x""#).is_err());
    }

    #[test]
    fn serialize() {
        let config = Config {
            keybindings: Keybindings {
                global: HashMap::from_iter([
                    (
                        Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL)),
                        GlobalAction::Quit,
                    ),
                    (Key(KeyCode::Char('?'), None), GlobalAction::Run),
                ]),
                form: HashMap::new(),
            },
            dev: true,
            ..Default::default()
        };
        let s = toml::to_string(&config).expect("failed to serialize config");
        let deserialized = toml::from_str::<Config>(&s).expect("failed to deserialize config");
        assert_eq!(deserialized, config);
    }

    #[test]
    fn default_keybindings_keep_user_choices() {
        let mut config = Config::default();
        config.keybindings.global.insert(
            Key(KeyCode::Char('q'), Some(KeyModifiers::CONTROL)),
            GlobalAction::Quit,
        );
        config.set_default_keybindings();
        assert!(!config
            .keybindings
            .global
            .contains_key(&Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL))));
        assert_eq!(
            config
                .keybindings
                .global
                .get(&Key(KeyCode::Char('r'), Some(KeyModifiers::CONTROL))),
            Some(&GlobalAction::Run)
        );
        assert_eq!(config.keybindings.form.len(), 8);
    }
}
