use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::category::CategoryStore;
use crate::error::StateError;
use crate::paths;
use crate::render::{RenderOptions, TextColor, MAX_SIZE, MIN_SIZE};
use crate::theme::ThemeVariant;

/// Everything persisted in `contents.json`. The font registry is not part of
/// it; fonts are rediscovered from the scan paths on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default = "default_predefined_paths")]
    pub font_paths_predefined: Vec<String>,
    #[serde(default)]
    pub font_paths_user: Vec<String>,
    #[serde(default)]
    pub categories: CategoryStore,
    #[serde(default = "default_render_text")]
    pub render_text: String,
    /// `#rrggbb`
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub use_lcd_rendering: bool,
    #[serde(default = "default_true")]
    pub use_auto_hinting: bool,
    #[serde(default = "default_true")]
    pub use_kerning: bool,
    #[serde(default = "default_theme")]
    pub theme: ThemeVariant,
}

fn default_predefined_paths() -> Vec<String> {
    paths::system_font_dirs()
        .into_iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}
fn default_render_text() -> String { "Sample Text".into() }
fn default_font_color() -> String { "#000000".into() }
fn default_font_size() -> u32 { 36 }
fn default_true() -> bool { true }
fn default_theme() -> ThemeVariant { ThemeVariant::CatppuccinLatte }

impl Default for AppState {
    fn default() -> Self {
        Self {
            font_paths_predefined: default_predefined_paths(),
            font_paths_user: Vec::new(),
            categories: CategoryStore::default(),
            render_text: default_render_text(),
            font_color: default_font_color(),
            font_size: default_font_size(),
            use_lcd_rendering: false,
            use_auto_hinting: true,
            use_kerning: true,
            theme: default_theme(),
        }
    }
}

impl AppState {
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let contents = fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut state: Self = serde_json::from_str(&contents).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        state.sanitize();
        Ok(state)
    }

    /// Load `path`, falling back to defaults when it is absent or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No saved state at {}, starting fresh", path.display());
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::error!("{}; using defaults", crate::error::chain(&e));
            Self::default()
        })
    }

    /// Clamp the font size and reject malformed colors.
    pub fn sanitize(&mut self) {
        self.font_size = self.font_size.clamp(MIN_SIZE, MAX_SIZE);
        if self.font_color.parse::<TextColor>().is_err() {
            tracing::warn!("Invalid font color '{}', using black", self.font_color);
            self.font_color = default_font_color();
        }
        self.font_paths_user.retain(|p| !p.trim().is_empty());
        for cat in self.categories.iter_mut() {
            if cat.preview_font_size == 0 {
                cat.preview_font_size = 24;
            }
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            size: self.font_size,
            color: self.font_color.parse().unwrap_or_default(),
            lcd: self.use_lcd_rendering,
            auto_hint: self.use_auto_hinting,
            kerning: self.use_kerning,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

            // Set restrictive permissions on the config directory (Unix only)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if dir == paths::config_dir() {
                    let _ = fs::set_permissions(dir, fs::Permissions::from_mode(0o700));
                }
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
        }
        tracing::debug!("State saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_values() {
        let state = AppState::default();
        assert_eq!(state.font_size, 36);
        assert_eq!(state.font_color, "#000000");
        assert!(state.use_auto_hinting && state.use_kerning);
        assert!(!state.use_lcd_rendering);
        assert!(state.categories.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg").join("contents.json");

        let mut state = AppState::default();
        state.font_paths_user.push("~/fonts".into());
        state.categories.add("Serif").unwrap();
        state.categories.add("Mono").unwrap();
        state
            .categories
            .assign("Serif", [PathBuf::from("/f/a.ttf"), PathBuf::from("/f/b.ttf")])
            .unwrap();
        state.categories.get_mut("Serif").unwrap().is_installed = true;
        state.render_text = "Hello".into();
        state.save(&path).unwrap();

        let loaded = AppState::load(&path).unwrap();
        assert_eq!(loaded, state);
        let serif = loaded.categories.get("Serif").unwrap();
        assert!(serif.is_installed);
        assert_eq!(serif.fonts_list.len(), 2);
        assert!(!loaded.categories.get("Mono").unwrap().is_installed);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_backwards_compat_missing_fields() {
        // older files carry paths, categories and render settings only
        let old_json = r##"{
            "font_paths_predefined": ["/usr/share/fonts/TTF"],
            "font_paths_user": [],
            "categories": [{"label": "Legacy", "fonts_list": ["/x/y.ttf"]}],
            "render_text": "Old",
            "font_color": "#ff0000"
        }"##;
        let state: AppState = serde_json::from_str(old_json).unwrap();
        assert_eq!(state.font_paths_predefined, vec!["/usr/share/fonts/TTF"]);
        assert_eq!(state.font_size, 36);
        assert!(state.use_kerning);
        assert_eq!(state.categories.get("Legacy").unwrap().fonts_list.len(), 1);
    }

    #[test]
    fn test_sanitize_clamps() {
        let mut state = AppState {
            font_size: 400,
            font_color: "purple".into(),
            ..AppState::default()
        };
        state.sanitize();
        assert_eq!(state.font_size, MAX_SIZE);
        assert_eq!(state.font_color, "#000000");

        state.font_size = 1;
        state.sanitize();
        assert_eq!(state.font_size, MIN_SIZE);
    }

    #[test]
    fn test_load_or_default_on_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("contents.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppState::load(&path), Err(StateError::Parse { .. })));
        assert_eq!(AppState::load_or_default(&path), AppState::default());
    }

    #[test]
    fn test_render_options_from_state() {
        let state = AppState {
            font_color: "#102030".into(),
            use_lcd_rendering: true,
            ..AppState::default()
        };
        let opts = state.render_options();
        assert_eq!(opts.color, TextColor::new(0x10, 0x20, 0x30));
        assert!(opts.lcd);
        assert_eq!(opts.size, 36);
    }
}
