use std::path::{Component, Path, PathBuf};

/// Environment variable that relocates the config directory (used by tests
/// and portable installs).
pub const CONFIG_DIR_ENV: &str = "TYPESHELF_CONFIG_DIR";

const APP_DIR: &str = "typeshelf";

// The install dir must never be one of the scan paths (or below one),
// otherwise installed symlinks would be rediscovered as new fonts.

#[cfg(target_os = "linux")]
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/usr/share/fonts/truetype",
    "/usr/share/fonts/opentype",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/OTF",
];

#[cfg(target_os = "macos")]
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/Library/Fonts",
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

#[cfg(target_os = "windows")]
const SYSTEM_FONT_DIRS: &[&str] = &[
    "C:\\Windows\\Fonts",
    "C:\\Program Files\\Common Files\\Microsoft\\Shared\\Fonts",
    "C:\\Program Files (x86)\\Common Files\\Microsoft\\Shared\\Fonts",
];

#[cfg(any(
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
const SYSTEM_FONT_DIRS: &[&str] = &["/usr/local/share/fonts", "/usr/X11R6/lib/X11/fonts"];

#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "windows",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
const SYSTEM_FONT_DIRS: &[&str] = &[];

#[cfg(target_os = "linux")]
const INSTALL_DIR: &str = "~/.local/share/fonts/typeshelf";
#[cfg(target_os = "macos")]
const INSTALL_DIR: &str = "~/Library/Fonts";
#[cfg(target_os = "windows")]
const INSTALL_DIR: &str = "~/AppData/Local/Microsoft/Windows/Fonts";
#[cfg(any(
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
const INSTALL_DIR: &str = "~/.local/share/fonts";
#[cfg(not(any(
    target_os = "linux",
    target_os = "macos",
    target_os = "windows",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
const INSTALL_DIR: &str = "~/.fonts";

/// Platform system font directories, as configured (not checked for existence).
pub fn system_font_dirs() -> Vec<PathBuf> {
    SYSTEM_FONT_DIRS.iter().map(PathBuf::from).collect()
}

/// Directory that receives the symlinks of installed categories.
pub fn install_dir() -> PathBuf {
    expand(INSTALL_DIR)
}

/// Linux → ~/.config/typeshelf/, macOS → ~/Library/Application Support/typeshelf/,
/// Windows → AppData/Roaming/typeshelf/
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn state_file() -> PathBuf {
    config_dir().join("contents.json")
}

pub fn saves_dir() -> PathBuf {
    config_dir().join("saves")
}

pub fn icons_dir() -> PathBuf {
    config_dir().join("category_icons")
}

/// Expand a leading `~` and make the path absolute, without touching the
/// filesystem.
pub fn expand(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    };
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };
    normalize(&absolute)
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

pub fn is_system_font(font_path: &Path) -> bool {
    SYSTEM_FONT_DIRS
        .iter()
        .any(|dir| font_path.starts_with(dir))
}

pub fn is_user_font(font_path: &Path) -> bool {
    dirs::home_dir().is_some_and(|home| font_path.starts_with(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_resolves_relative_components() {
        let p = expand("/usr/share/fonts/../fonts/./TTF");
        assert_eq!(p, PathBuf::from("/usr/share/fonts/TTF"));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand("~/fonts"), home.join("fonts"));
        }
    }

    #[test]
    fn test_expand_relative_is_absolute() {
        assert!(expand("some/dir").is_absolute());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_system_font_classification() {
        assert!(is_system_font(Path::new("/usr/share/fonts/TTF/DejaVuSans.ttf")));
        assert!(!is_system_font(Path::new("/opt/fonts/a.ttf")));
    }

    #[test]
    fn test_install_dir_not_a_system_dir() {
        let install = install_dir();
        assert!(system_font_dirs().iter().all(|d| !install.starts_with(d)));
    }
}
