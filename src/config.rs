use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};
use crate::template::Template;

const APP_DIR: &str = "muxdeck";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub foreground: String,
    pub background: String,
}

/// Colour strings, each a ratatui colour name, `#rrggbb` or a 0-255 index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub title: ColorPair,
    pub selected: String,
    pub dimmed: String,
    pub help: String,
    pub error: String,
    pub success: String,
    pub border: String,
    pub input: String,
    pub focused_input: String,
    pub spinner: String,
    pub highlight: String,
    pub filter_border: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            title: ColorPair {
                foreground: "#FAFAFA".to_string(),
                background: "#7D56F4".to_string(),
            },
            selected: "#EE6FF8".to_string(),
            dimmed: "#626262".to_string(),
            help: "#626262".to_string(),
            error: "#FF0000".to_string(),
            success: "#00FF00".to_string(),
            border: "#874BFD".to_string(),
            input: "#874BFD".to_string(),
            focused_input: "#FF75B7".to_string(),
            spinner: "205".to_string(),
            highlight: "#FF75B7".to_string(),
            filter_border: "#FF75B7".to_string(),
        }
    }
}

/// Contents of `config.toml`; every field falls back to its default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repo_directories: Vec<String>,
    pub templates: Vec<Template>,
    pub colors: Palette,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub keybindings: HashMap<String, OneOrMany>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_directories: vec![
                "~/src".to_string(),
                "~/code".to_string(),
                "~/projects".to_string(),
            ],
            templates: Template::defaults(),
            colors: Palette::default(),
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// `<config dir>/muxdeck/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::config("Cannot determine config directory"))?;
        Ok(dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file is created with the default configuration; a
    /// missing explicit file is an error.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path, false).await,
            None => Self::load_from(&Self::default_path()?, true).await,
        }
    }

    pub async fn load_from(path: &Path, create_if_missing: bool) -> Result<Self> {
        if create_if_missing && !fs::try_exists(path).await? {
            let cfg = Self::default();
            cfg.save(path).await?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(cfg);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let cfg = toml::from_str::<Self>(&content)?;
        Ok(cfg)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings::from_overrides(self.keybindings.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    const fn ctrl(ch: char) -> Self {
        Self {
            code: KeyCode::Char(ch),
            modifiers: KeyModifiers::CONTROL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<&'static str, Vec<KeySpec>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use KeyCode::{Char, Down, Enter, Esc, Up};

        let mut kb = Self {
            bindings: HashMap::new(),
        };

        kb.bindings.insert(
            "quit",
            vec![KeySpec::plain(Char('q')), KeySpec::ctrl('c')],
        );
        kb.bindings.insert(
            "up",
            vec![KeySpec::plain(Up), KeySpec::plain(Char('k'))],
        );
        kb.bindings.insert(
            "down",
            vec![KeySpec::plain(Down), KeySpec::plain(Char('j'))],
        );
        kb.bindings.insert(
            "select",
            vec![KeySpec::plain(Enter), KeySpec::plain(Char('l'))],
        );
        kb.bindings.insert(
            "back",
            vec![
                KeySpec::plain(Esc),
                KeySpec::plain(Char('h')),
                KeySpec::plain(Char('q')),
            ],
        );
        kb.bindings.insert(
            "create",
            vec![KeySpec::plain(Char('c')), KeySpec::plain(Char('n'))],
        );
        kb.bindings
            .insert("rename", vec![KeySpec::plain(Char('r'))]);
        kb.bindings.insert(
            "delete",
            vec![KeySpec::plain(Char('d')), KeySpec::plain(Char('x'))],
        );
        kb.bindings
            .insert("filter", vec![KeySpec::plain(Char('/'))]);
        kb.bindings.insert("visual", vec![KeySpec::ctrl('v')]);
        kb.bindings.insert("refresh", vec![KeySpec::ctrl('r')]);
        kb.bindings.insert(
            "confirm",
            vec![KeySpec::plain(Char('y')), KeySpec::plain(Char('Y'))],
        );
        kb.bindings.insert(
            "cancel",
            vec![
                KeySpec::plain(Char('n')),
                KeySpec::plain(Char('N')),
                KeySpec::plain(Esc),
                KeySpec::plain(Char('q')),
            ],
        );

        kb
    }
}

impl KeyBindings {
    /// Defaults with the `[keybindings]` table applied on top.
    ///
    /// Unknown actions and unparsable key specs are ignored.
    pub fn from_overrides(overrides: HashMap<String, OneOrMany>) -> Self {
        let mut kb = Self::default();

        for (action, spec) in overrides {
            let parsed: Vec<KeySpec> = spec
                .into_vec()
                .iter()
                .filter_map(|s| parse_key_spec(s))
                .collect();
            if parsed.is_empty() {
                continue;
            }
            match kb.bindings.get_mut(action.as_str()) {
                Some(slot) => *slot = parsed,
                None => tracing::warn!("Ignoring key binding for unknown action {action}"),
            }
        }

        kb
    }

    pub fn matches(&self, action: &'static str, code: &KeyCode, modifiers: KeyModifiers) -> bool {
        // Terminals report SHIFT alongside upper-case characters.
        let modifiers = if matches!(code, KeyCode::Char(_)) {
            modifiers.difference(KeyModifiers::SHIFT)
        } else {
            modifiers
        };
        self.bindings
            .get(action)
            .is_some_and(|v| v.iter().any(|k| &k.code == code && k.modifiers == modifiers))
    }

    /// Every binding of `action` joined with `/` for the help line
    pub fn label(&self, action: &'static str) -> String {
        self.bindings
            .get(action)
            .map(|v| {
                v.iter()
                    .map(|k| format_key_spec(*k))
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }
}

fn format_key_spec(k: KeySpec) -> String {
    let key = match k.code {
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        other => format!("{other:?}").to_lowercase(),
    };
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        format!("ctrl+{key}")
    } else if k.modifiers.contains(KeyModifiers::ALT) {
        format!("alt+{key}")
    } else {
        key
    }
}

fn parse_key_spec(s: &str) -> Option<KeySpec> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut modifiers = KeyModifiers::NONE;
    let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
    let (mods, key_part) = if parts.len() >= 2 {
        (&parts[..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    for m in mods {
        match m.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let code = match key_part.to_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => {
            // Single-character fallback (keeps case for e.g. "D")
            let mut chars = key_part.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return None,
            }
        }
    };

    Some(KeySpec { code, modifiers })
}
