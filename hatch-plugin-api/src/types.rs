//! Plugin types and metadata structures

use serde::{Deserialize, Serialize};

/// Plugin manifest containing metadata about the plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Reverse-DNS identifier, unique within a registry (e.g. `com.example.hello`)
    pub bundle_identifier: String,
    /// Human-readable name shown in the host
    pub display_name: String,
    /// Plugin author
    pub author: String,
    /// One-line description
    #[serde(default)]
    pub short_description: String,
    /// Source repository URL
    #[serde(default)]
    pub repository: String,
    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Icon name hint for the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_hint: Option<String>,
}

impl PluginManifest {
    /// Create a manifest with the three required fields
    pub fn new(
        bundle_identifier: impl Into<String>,
        display_name: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            bundle_identifier: bundle_identifier.into(),
            display_name: display_name.into(),
            author: author.into(),
            ..Default::default()
        }
    }
}

/// Which presentation surfaces a plugin offers.
///
/// Declared once by the plugin; the host never inspects view types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surfaces {
    /// The plugin renders a main view
    pub has_view: bool,
    /// The plugin renders a settings page
    pub has_settings_view: bool,
}

impl Surfaces {
    /// No view and no settings page
    pub const fn none() -> Self {
        Self {
            has_view: false,
            has_settings_view: false,
        }
    }

    /// Main view only
    pub const fn view() -> Self {
        Self {
            has_view: true,
            has_settings_view: false,
        }
    }

    /// Settings page only
    pub const fn settings() -> Self {
        Self {
            has_view: false,
            has_settings_view: true,
        }
    }

    /// Both a main view and a settings page
    pub const fn all() -> Self {
        Self {
            has_view: true,
            has_settings_view: true,
        }
    }
}
