use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One window of a session template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl WindowSpec {
    pub fn new(name: Option<&str>, command: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            command: command.map(str::to_string),
        }
    }

    /// Window name, treating an empty string as unset
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Start command, treating an empty string as unset
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Reusable window layout used to bootstrap a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub windows: Vec<WindowSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused_window: Option<String>,
}

impl Template {
    pub fn focused_window(&self) -> Option<&str> {
        self.focused_window.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub(crate) fn defaults() -> Vec<Template> {
        vec![
            Template {
                name: "basic".to_string(),
                description: "Single window with shell".to_string(),
                windows: vec![WindowSpec::new(Some("main"), None)],
                focused_window: None,
            },
            Template {
                name: "coding".to_string(),
                description: "Editor, server, and shell windows".to_string(),
                windows: vec![
                    WindowSpec::new(Some("editor"), Some("nvim .")),
                    WindowSpec::new(Some("server"), None),
                    WindowSpec::new(Some("shell"), None),
                ],
                focused_window: Some("editor".to_string()),
            },
            Template {
                name: "monitor".to_string(),
                description: "App, logs, and monitoring".to_string(),
                windows: vec![
                    WindowSpec::new(Some("app"), None),
                    WindowSpec::new(Some("logs"), Some("tail -f *.log")),
                    WindowSpec::new(Some("monitor"), Some("htop")),
                ],
                focused_window: None,
            },
        ]
    }
}

/// Fixed set of templates, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Look up a template by name
    pub fn find(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))
    }
}
