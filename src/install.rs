//! Category install/uninstall via symlinks, and the font cache rebuild.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::category::Category;
use crate::error::InstallError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: usize,
    /// Destinations that already existed.
    pub skipped: usize,
    /// Members whose source file is gone.
    pub missing: Vec<PathBuf>,
    /// Members that could not be linked, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed: usize,
    pub failed: Vec<(PathBuf, String)>,
}

fn destination(install_dir: &Path, font: &Path) -> Option<PathBuf> {
    font.file_name().map(|name| install_dir.join(name))
}

#[cfg(unix)]
fn link(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dest)
}

#[cfg(windows)]
fn link(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dest)
}

/// Symlink every present member of `category` into `install_dir`.
/// Flags the category installed when at least one link was created.
pub fn install_category(
    category: &mut Category,
    install_dir: &Path,
) -> Result<InstallReport, InstallError> {
    std::fs::create_dir_all(install_dir).map_err(|source| InstallError::InstallDir {
        path: install_dir.to_path_buf(),
        source,
    })?;

    let mut report = InstallReport::default();
    for font in &category.fonts_list {
        if !font.is_file() {
            tracing::warn!("Font missing, not installed: {}", font.display());
            report.missing.push(font.clone());
            continue;
        }
        let Some(dest) = destination(install_dir, font) else {
            report.failed.push((font.clone(), "no file name".into()));
            continue;
        };
        // symlink_metadata also sees dangling links
        if dest.symlink_metadata().is_ok() {
            report.skipped += 1;
            continue;
        }
        match link(font, &dest) {
            Ok(()) => report.installed += 1,
            Err(e) => {
                tracing::error!("Linking {} failed: {e}", font.display());
                report.failed.push((font.clone(), e.to_string()));
            }
        }
    }

    if report.installed > 0 {
        category.is_installed = true;
    }
    tracing::info!(
        "Installed {} fonts from '{}' ({} skipped, {} missing, {} failed)",
        report.installed,
        category.label,
        report.skipped,
        report.missing.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Remove the symlinks of `category` from `install_dir`. Regular files are
/// never touched.
pub fn uninstall_category(category: &mut Category, install_dir: &Path) -> UninstallReport {
    let mut report = UninstallReport::default();
    for font in &category.fonts_list {
        let Some(dest) = destination(install_dir, font) else {
            continue;
        };
        let is_link = dest
            .symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink());
        if !is_link {
            continue;
        }
        match std::fs::remove_file(&dest) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                tracing::error!("Removing {} failed: {e}", dest.display());
                report.failed.push((dest, e.to_string()));
            }
        }
    }

    if report.removed > 0 {
        category.is_installed = false;
    }
    tracing::info!("Removed {} fonts of '{}'", report.removed, category.label);
    report
}

// ─── FONT CACHE ─────────────────────────────────────────────────

/// External command that rebuilds the system font cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCacheCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for FontCacheCommand {
    fn default() -> Self {
        Self {
            program: "fc-cache".into(),
            args: vec!["-fv".into()],
        }
    }
}

impl fmt::Display for FontCacheCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl FontCacheCommand {
    /// Run to completion (blocking) and return stdout on success.
    pub fn run(&self) -> Result<String, InstallError> {
        tracing::info!("Running '{self}'");
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| InstallError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!("'{self}' failed with {}", output.status);
            Err(InstallError::CacheRebuild {
                status: output.status.to_string(),
                stderr,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn category_with(paths: Vec<PathBuf>) -> Category {
        let mut cat = Category::new("Test");
        cat.fonts_list = paths;
        cat
    }

    #[test]
    fn test_install_one_missing_one_present() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("Present.ttf");
        std::fs::write(&present, b"font").unwrap();
        let missing = tmp.path().join("Missing.ttf");
        let install_dir = tmp.path().join("installed");

        let mut cat = category_with(vec![missing.clone(), present.clone()]);
        let report = install_category(&mut cat, &install_dir).unwrap();
        assert_eq!(report.installed, 1);
        assert_eq!(report.missing, vec![missing]);
        assert!(cat.is_installed);

        let links: Vec<_> = std::fs::read_dir(&install_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(std::fs::read_link(&links[0]).unwrap(), present);
    }

    #[test]
    fn test_install_skips_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let font = tmp.path().join("A.ttf");
        std::fs::write(&font, b"font").unwrap();
        let install_dir = tmp.path().join("installed");
        let mut cat = category_with(vec![font]);

        install_category(&mut cat, &install_dir).unwrap();
        cat.is_installed = false;
        let again = install_category(&mut cat, &install_dir).unwrap();
        assert_eq!(again.installed, 0);
        assert_eq!(again.skipped, 1);
        assert!(!cat.is_installed);
    }

    #[test]
    fn test_uninstall_removes_only_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("A.ttf");
        let b = tmp.path().join("B.ttf");
        std::fs::write(&a, b"font").unwrap();
        std::fs::write(&b, b"font").unwrap();
        let install_dir = tmp.path().join("installed");
        std::fs::create_dir_all(&install_dir).unwrap();
        // a real file with the same name as member B
        std::fs::write(install_dir.join("B.ttf"), b"user copy").unwrap();

        let mut cat = category_with(vec![a.clone(), b.clone()]);
        install_category(&mut cat, &install_dir).unwrap();
        assert!(cat.is_installed);

        let report = uninstall_category(&mut cat, &install_dir);
        assert_eq!(report.removed, 1);
        assert!(!cat.is_installed);
        assert!(install_dir.join("B.ttf").exists());
        assert!(install_dir.join("A.ttf").symlink_metadata().is_err());
    }

    #[test]
    fn test_uninstall_nothing_keeps_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cat = category_with(vec![tmp.path().join("A.ttf")]);
        cat.is_installed = true;
        let report = uninstall_category(&mut cat, tmp.path());
        assert_eq!(report.removed, 0);
        assert!(cat.is_installed);
    }

    #[test]
    fn test_cache_command_success_and_failure() {
        let ok = FontCacheCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "echo cached".into()],
        };
        assert_eq!(ok.run().unwrap().trim(), "cached");

        let bad = FontCacheCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "echo broken >&2; exit 3".into()],
        };
        match bad.run() {
            Err(InstallError::CacheRebuild { stderr, .. }) => assert_eq!(stderr.trim(), "broken"),
            other => panic!("unexpected: {other:?}"),
        }

        let absent = FontCacheCommand {
            program: "typeshelf-no-such-binary".into(),
            args: Vec::new(),
        };
        assert!(matches!(absent.run(), Err(InstallError::Spawn { .. })));
    }

    #[test]
    fn test_default_command() {
        assert_eq!(FontCacheCommand::default().to_string(), "fc-cache -fv");
    }
}
