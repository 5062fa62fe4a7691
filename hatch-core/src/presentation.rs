//! What the host should render for the active plugin
//!
//! Decided from the surfaces a plugin declares, never from its view types.

use uuid::Uuid;

use crate::plugins::PluginDescriptor;

/// Text shown when the active plugin only has a settings page
pub const SETTINGS_PROMPT: &str = "This plugin offers a preference page";

/// Text shown when the active plugin has neither surface
pub const PLACEHOLDER: &str = "Plugin doesn't have a renderer";

/// Main area content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// No plugin is active
    Nothing,
    /// Render the plugin's main view
    View(Uuid),
    /// Point the user at the plugin's settings page
    SettingsPrompt(Uuid),
    /// The plugin renders nothing
    Placeholder,
}

/// Main area content for the active plugin
pub fn surface_for(active: Option<&PluginDescriptor>) -> Surface {
    let Some(plugin) = active else {
        return Surface::Nothing;
    };

    if plugin.surfaces.has_view {
        Surface::View(plugin.id)
    } else if plugin.surfaces.has_settings_view {
        Surface::SettingsPrompt(plugin.id)
    } else {
        Surface::Placeholder
    }
}

/// Plugins that get a tab in the settings window, in registry order
pub fn settings_tabs<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
) -> Vec<&'a PluginDescriptor> {
    plugins
        .into_iter()
        .filter(|plugin| plugin.surfaces.has_settings_view)
        .collect()
}
