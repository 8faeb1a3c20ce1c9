//! Named palettes and the persisted theme preference.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::storage::KeyValueStore;

pub const THEME_KEY: &str = "genex-theme";
pub const SYSTEM: &str = "system";
pub const LIGHT_THEME: &str = "frost";
pub const DARK_THEME: &str = "onyx";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: &'static str,
    pub name: &'static str,
    pub appearance: Appearance,
    /// CSS custom properties, in declaration order.
    pub variables: &'static [(&'static str, &'static str)],
}

impl Theme {
    /// `:root[data-theme="<id>"] { ... }`
    pub fn css(&self) -> String {
        let mut css = format!(":root[data-theme=\"{}\"] {{\n", self.id);
        for (property, value) in self.variables {
            css.push_str(&format!("  {property}: {value};\n"));
        }
        css.push('}');
        css
    }

    pub fn variable(&self, property: &str) -> Option<&'static str> {
        self.variables
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| *value)
    }
}

pub static THEMES: [Theme; 2] = [
    Theme {
        id: LIGHT_THEME,
        name: "Frost",
        appearance: Appearance::Light,
        variables: &[
            ("--theme-name", "Frost"),
            ("--bg-primary", "#ffffff"),
            ("--bg-surface", "#f8f9fa"),
            ("--accent-primary", "#228be6"),
            ("--accent-secondary", "#228be6"),
            ("--text-primary", "#212529"),
            ("--text-secondary", "#495057"),
            ("--image-filter", "none"),
            ("--border-style", "solid"),
            ("--border-width", "1px"),
            ("--border-color", "#dee2e6"),
            ("--border-radius", "4px"),
            ("--box-shadow", "0 2px 4px rgba(0,0,0,0.05)"),
        ],
    },
    Theme {
        id: DARK_THEME,
        name: "Onyx",
        appearance: Appearance::Dark,
        variables: &[
            ("--theme-name", "Onyx"),
            ("--bg-primary", "#1a1b1e"),
            ("--bg-surface", "#25262b"),
            ("--accent-primary", "#748ffc"),
            ("--accent-secondary", "#748ffc"),
            ("--text-primary", "#eceef2"),
            ("--text-secondary", "#909296"),
            ("--image-filter", "none"),
        ],
    },
];

pub fn find_theme(id: &str) -> Option<&'static Theme> {
    THEMES.iter().find(|theme| theme.id == id)
}

/// Light or dark, as reported by the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

impl FromStr for Appearance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Appearance::Light),
            "dark" => Ok(Appearance::Dark),
            other => Err(format!("unknown appearance '{other}' (expected light or dark)")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ThemePreference {
    #[default]
    System,
    Named(&'static str),
}

impl ThemePreference {
    pub fn parse(id: &str) -> ServiceResult<Self> {
        if id == SYSTEM {
            return Ok(ThemePreference::System);
        }
        find_theme(id)
            .map(|theme| ThemePreference::Named(theme.id))
            .ok_or_else(|| ServiceError::UnknownTheme(id.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::System => SYSTEM,
            ThemePreference::Named(id) => *id,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ThemeManager {
    storage: Arc<dyn KeyValueStore>,
    preference: ThemePreference,
    appearance: Appearance,
}

impl ThemeManager {
    /// Load the stored preference. Unknown stored ids fall back to `system`.
    pub fn load(storage: Arc<dyn KeyValueStore>, appearance: Appearance) -> Self {
        let preference = match storage.get(THEME_KEY) {
            Ok(Some(id)) => ThemePreference::parse(&id).unwrap_or_else(|err| {
                warn!(error = %err, "Ignoring stored theme");
                ThemePreference::System
            }),
            Ok(None) => ThemePreference::System,
            Err(err) => {
                warn!(error = %err, "Could not read theme preference");
                ThemePreference::System
            }
        };
        Self {
            storage,
            preference,
            appearance,
        }
    }

    pub fn preference(&self) -> &ThemePreference {
        &self.preference
    }

    pub fn set_preference(&mut self, id: &str) -> ServiceResult<&'static Theme> {
        let preference = ThemePreference::parse(id)?;
        self.storage.set(THEME_KEY, preference.as_str())?;
        debug!(theme = %preference, "Theme preference saved");
        self.preference = preference;
        Ok(self.active())
    }

    /// Follow a change in the environment's light/dark setting.
    pub fn set_appearance(&mut self, appearance: Appearance) -> &'static Theme {
        self.appearance = appearance;
        self.active()
    }

    pub fn active(&self) -> &'static Theme {
        resolve(&self.preference, self.appearance)
    }
}

pub fn resolve(preference: &ThemePreference, appearance: Appearance) -> &'static Theme {
    let id = match preference {
        ThemePreference::Named(id) => *id,
        ThemePreference::System => match appearance {
            Appearance::Dark => DARK_THEME,
            Appearance::Light => LIGHT_THEME,
        },
    };
    find_theme(id).unwrap_or(&THEMES[0])
}
