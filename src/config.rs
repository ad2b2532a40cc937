use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub dictation: DictationConfig,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    // Note list
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_search")]
    pub search: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_category_left")]
    pub category_left: String,
    #[serde(default = "default_category_right")]
    pub category_right: String,
    #[serde(default = "default_set_pin")]
    pub set_pin: String,
    #[serde(default = "default_export")]
    pub export: String,
    #[serde(default = "default_clear_all")]
    pub clear_all: String,
    #[serde(default = "default_help")]
    pub help: String,
    // Editor
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_toggle_pin")]
    pub toggle_pin: String,
    #[serde(default = "default_toggle_lock")]
    pub toggle_lock: String,
    #[serde(default = "default_cycle_color")]
    pub cycle_color: String,
    #[serde(default = "default_cycle_category")]
    pub cycle_category: String,
    #[serde(default = "default_ai_menu")]
    pub ai_menu: String,
    #[serde(default = "default_dictation")]
    pub dictation: String,
    #[serde(default = "default_delete_note")]
    pub delete_note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_ai_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictationConfig {
    /// External speech-to-text program printing one transcript per line.
    /// Dictation is unavailable when unset.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            autosave_delay_ms: default_autosave_delay_ms(),
            export_dir: None,
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            ai: AiConfig::default(),
            dictation: DictationConfig::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            select: default_select(),
            delete: default_delete(),
            search: default_search(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            category_left: default_category_left(),
            category_right: default_category_right(),
            set_pin: default_set_pin(),
            export: default_export(),
            clear_all: default_clear_all(),
            help: default_help(),
            save: default_save(),
            toggle_pin: default_toggle_pin(),
            toggle_lock: default_toggle_lock(),
            cycle_color: default_cycle_color(),
            cycle_category: default_cycle_category(),
            ai_menu: default_ai_menu(),
            dictation: default_dictation(),
            delete_note: default_delete_note(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_ai_model(),
            endpoint: default_ai_endpoint(),
            api_key_env: default_ai_api_key_env(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl Theme {
    /// Get preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("dark".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "magenta".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "darkgray".to_string(),
        });

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "#C026D3".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "#FCE7F3".to_string(),
        });

        themes.insert("green".to_string(), Theme {
            fg: "green".to_string(),
            bg: "black".to_string(),
            highlight_bg: "yellow".to_string(),
            highlight_fg: "black".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only; the profile decides the real location at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("notes.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/notepin/notes.db".to_string()
    }
}

fn default_autosave_delay_ms() -> u64 {
    1000
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_select() -> String {
    "Enter".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_search() -> String {
    "/".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_category_left() -> String {
    "Left".to_string()
}

fn default_category_right() -> String {
    "Right".to_string()
}

fn default_set_pin() -> String {
    "P".to_string()
}

fn default_export() -> String {
    "x".to_string()
}

fn default_clear_all() -> String {
    "X".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_toggle_pin() -> String {
    "Ctrl+p".to_string()
}

fn default_toggle_lock() -> String {
    "Ctrl+l".to_string()
}

fn default_cycle_color() -> String {
    "Ctrl+o".to_string()
}

fn default_cycle_category() -> String {
    "Ctrl+g".to_string()
}

fn default_ai_menu() -> String {
    "Ctrl+a".to_string()
}

fn default_dictation() -> String {
    "Ctrl+t".to_string()
}

fn default_delete_note() -> String {
    "Ctrl+d".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "magenta".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_ai_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    60
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration for a profile, creating the default file if missing.
    /// The database path always follows the profile.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let mut config = Self::load_from_path(&config_path)?;
        config.database_path = Self::default_database_path_for_profile(profile);
        Ok(config)
    }

    /// Load from an explicit file, creating it with defaults if missing.
    /// Unlike profile loading, a database path set in the file is honored.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            let mut config = Config::default();
            config.save_to_path(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("notes.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/notepin-dev/notes.db".to_string(),
                utils::Profile::Prod => "~/.local/share/notepin/notes.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Get the currently active theme: user-defined first, then presets.
    /// If highlight_fg is empty it is derived from highlight_bg.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{parse_color, get_contrast_text_color, format_color_for_display};

        let mut theme = if let Some(theme) = self.themes.get(&self.current_theme) {
            theme.clone()
        } else if let Some(theme) = Theme::get_preset_themes().get(&self.current_theme) {
            theme.clone()
        } else {
            Theme::default()
        };

        if theme.highlight_fg.is_empty() {
            let highlight_bg_color = parse_color(&theme.highlight_bg);
            let calculated_fg = get_contrast_text_color(highlight_bg_color);
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }
}
