//! In-memory index of discovered font files.
//!
//! The registry is rebuilt from the configured scan paths on every load and
//! never persisted. A font's identity is its absolute path. During a scan a
//! second file with the same name (ignoring case) is treated as a duplicate
//! of the first one seen, so predefined (system) paths win over user paths.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::RegistryError;
use crate::font_info::FontRecord;
use crate::paths;

/// Outcome of a directory scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub added: usize,
    pub duplicates: usize,
    pub invalid_paths: Vec<PathBuf>,
}

/// Expand and absolutize `paths`, then split them into existing and missing.
/// The invalid half keeps the paths as given.
pub fn verify_paths<P: AsRef<Path>>(paths: &[P]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for p in paths {
        let expanded = paths::expand(p);
        if expanded.exists() {
            valid.push(expanded);
        } else {
            invalid.push(p.as_ref().to_path_buf());
        }
    }
    (valid, invalid)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: Vec<FontRecord>,
    paths: HashSet<PathBuf>,
    file_keys: HashSet<String>,
    /// Directory never descended into while scanning (the install dir).
    excluded: Option<PathBuf>,
}

impl FontRegistry {
    pub fn with_excluded(excluded: impl AsRef<Path>) -> Self {
        Self {
            excluded: Some(paths::expand(excluded)),
            ..Self::default()
        }
    }

    /// Walk predefined paths, then user paths, registering every `.ttf`/`.otf`.
    pub fn scan<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        predefined: &[P],
        user: &[Q],
    ) -> ScanReport {
        let mut report = ScanReport::default();
        let (pre_valid, pre_invalid) = verify_paths(predefined);
        let (user_valid, user_invalid) = verify_paths(user);
        report.invalid_paths.extend(pre_invalid);
        report.invalid_paths.extend(user_invalid);
        if !report.invalid_paths.is_empty() {
            tracing::warn!("Invalid font paths: {:?}", report.invalid_paths);
        }

        for root in pre_valid.iter().chain(user_valid.iter()) {
            self.scan_dir(root, &mut report);
        }
        tracing::info!(
            "Scan complete: {} added, {} duplicates, {} fonts total",
            report.added,
            report.duplicates,
            self.fonts.len()
        );
        report
    }

    fn scan_dir(&mut self, root: &Path, report: &mut ScanReport) {
        let excluded = self.excluded.clone();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| excluded.as_deref().is_none_or(|x| !e.path().starts_with(x)));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_font_file(entry.path()) {
                continue;
            }
            let path = paths::expand(entry.path());
            if self.paths.contains(&path) {
                continue;
            }
            let key = entry.file_name().to_string_lossy().to_lowercase();
            if self.file_keys.contains(&key) {
                tracing::debug!("Duplicate font file name skipped: {}", path.display());
                report.duplicates += 1;
                continue;
            }
            self.insert(FontRecord::from_path(&path));
            report.added += 1;
        }
    }

    fn insert(&mut self, record: FontRecord) {
        self.paths.insert(record.font_path.clone());
        self.file_keys.insert(record.file_key());
        self.fonts.push(record);
    }

    /// Register a record. Returns false when its path is already present.
    pub fn add(&mut self, record: FontRecord) -> bool {
        if self.paths.contains(&record.font_path) {
            return false;
        }
        self.insert(record);
        true
    }

    /// Register the font at `path`, or return the existing record.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<&FontRecord, RegistryError> {
        let path = paths::expand(path);
        if !path.is_file() {
            return Err(RegistryError::InvalidPath(path));
        }
        if !self.paths.contains(&path) {
            self.insert(FontRecord::from_path(&path));
        }
        self.get_by_path(&path)
            .ok_or_else(|| RegistryError::FontNotFound(path.display().to_string()))
    }

    pub fn remove_by_path(&mut self, path: &Path) -> Option<FontRecord> {
        let pos = self.fonts.iter().position(|f| f.font_path == path)?;
        let record = self.fonts.remove(pos);
        self.paths.remove(&record.font_path);
        let key = record.file_key();
        if !self.fonts.iter().any(|f| f.file_key() == key) {
            self.file_keys.remove(&key);
        }
        Some(record)
    }

    pub fn get_by_path(&self, path: &Path) -> Option<&FontRecord> {
        if !self.paths.contains(path) {
            return None;
        }
        self.fonts.iter().find(|f| f.font_path == path)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&FontRecord> {
        self.fonts.iter().find(|f| f.id == id)
    }

    pub fn get_by_file_name(&self, file_name: &str) -> Option<&FontRecord> {
        let key = file_name.to_lowercase();
        self.fonts.iter().find(|f| f.file_key() == key)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn set_note(&mut self, path: &Path, note: &str) -> Result<(), RegistryError> {
        let record = self
            .fonts
            .iter_mut()
            .find(|f| f.font_path == path)
            .ok_or_else(|| RegistryError::FontNotFound(path.display().to_string()))?;
        record.user_note = note.trim().to_string();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
        self.paths.clear();
        self.file_keys.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontRecord> {
        self.fonts.iter()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Case-insensitive substring match on name, file or path.
    pub fn filter(&self, query: &str, hide_system: bool, hide_user: bool) -> Vec<&FontRecord> {
        let query = query.trim().to_lowercase();
        self.fonts
            .iter()
            .filter(|f| !(hide_system && paths::is_system_font(&f.font_path)))
            .filter(|f| !(hide_user && paths::is_user_font(&f.font_path)))
            .filter(|f| {
                query.is_empty()
                    || f.font_name.to_lowercase().contains(&query)
                    || f.file_key().contains(&query)
                    || f.font_path.to_string_lossy().to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn font_list_text(&self) -> String {
        let mut sorted: Vec<&FontRecord> = self.iter().collect();
        sorted.sort_by(|a, b| a.font_name.cmp(&b.font_name));

        let mut out = String::from("Font List\n");
        out.push_str(&"=".repeat(50));
        out.push_str("\n\n");
        for f in sorted {
            let _ = writeln!(out, "Name: {}", f.font_name);
            let _ = writeln!(out, "Style: {}", f.font_style);
            let _ = writeln!(out, "File: {}", f.font_file);
            if !f.user_note.is_empty() {
                let _ = writeln!(out, "Note: {}", f.user_note);
            }
            out.push_str(&"-".repeat(30));
            out.push('\n');
        }
        out
    }

    /// Write the sorted font list to `path`, returning the font count.
    pub fn export_font_list(&self, path: &Path) -> Result<usize, RegistryError> {
        std::fs::write(path, self.font_list_text()).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Font list exported to {}", path.display());
        Ok(self.fonts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEJAVU: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

    fn write_font(dir: &Path, name: &str) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let p = dir.join(name);
        std::fs::write(&p, DEJAVU).unwrap();
        p
    }

    #[test]
    fn test_verify_paths_splits() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let (valid, invalid) = verify_paths(&[tmp.path().to_path_buf(), missing.clone()]);
        assert_eq!(valid, vec![paths::expand(tmp.path())]);
        assert_eq!(invalid, vec![missing]);
    }

    #[test]
    fn test_scan_matches_extensions_case_insensitively() {
        let tmp = tempfile::tempdir().unwrap();
        write_font(tmp.path(), "A.TTF");
        write_font(&tmp.path().join("sub"), "b.otf");
        std::fs::write(tmp.path().join("readme.txt"), "x").unwrap();

        let mut reg = FontRegistry::default();
        let report = reg.scan(&[tmp.path()], &[] as &[&Path]);
        assert_eq!(report.added, 2);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_scan_dedup_prefers_predefined() {
        let tmp = tempfile::tempdir().unwrap();
        let sys = write_font(&tmp.path().join("system"), "Foo.ttf");
        write_font(&tmp.path().join("user"), "foo.TTF");

        let mut reg = FontRegistry::default();
        let report = reg.scan(&[tmp.path().join("system")], &[tmp.path().join("user")]);
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(reg.iter().next().unwrap().font_path, sys);
    }

    #[test]
    fn test_rescan_same_path_adds_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write_font(tmp.path(), "Foo.ttf");
        let mut reg = FontRegistry::default();
        reg.scan(&[tmp.path()], &[] as &[&Path]);
        let report = reg.scan(&[tmp.path()], &[] as &[&Path]);
        assert_eq!(report.added, 0);
        assert_eq!(report.duplicates, 0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_scan_skips_excluded_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write_font(tmp.path(), "Keep.ttf");
        write_font(&tmp.path().join("installed"), "Linked.ttf");
        let mut reg = FontRegistry::with_excluded(tmp.path().join("installed"));
        reg.scan(&[tmp.path()], &[] as &[&Path]);
        assert_eq!(reg.len(), 1);
        assert!(reg.get_by_file_name("keep.TTF").is_some());
    }

    #[test]
    fn test_invalid_paths_reported() {
        let mut reg = FontRegistry::default();
        let report = reg.scan(&["/definitely/not/here"], &[] as &[&Path]);
        assert_eq!(report.invalid_paths, vec![PathBuf::from("/definitely/not/here")]);
    }

    #[test]
    fn test_lookup_note_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write_font(tmp.path(), "Foo.ttf");
        let mut reg = FontRegistry::default();
        let id = reg.add_path(&p).unwrap().id.clone();
        assert_eq!(reg.get_by_id(&id).unwrap().font_path, p);

        reg.set_note(&p, "  headline  ").unwrap();
        assert_eq!(reg.get_by_path(&p).unwrap().user_note, "headline");

        assert!(reg.remove_by_path(&p).is_some());
        assert!(reg.get_by_file_name("foo.ttf").is_none());
        assert!(matches!(
            reg.set_note(&p, "x"),
            Err(RegistryError::FontNotFound(_))
        ));
    }

    #[test]
    fn test_add_path_rejects_missing_file() {
        let mut reg = FontRegistry::default();
        assert!(matches!(
            reg.add_path("/no/such/font.ttf"),
            Err(RegistryError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_filter_query() {
        let tmp = tempfile::tempdir().unwrap();
        write_font(tmp.path(), "Alpha.ttf");
        write_font(tmp.path(), "Beta.otf");
        let mut reg = FontRegistry::default();
        reg.scan(&[tmp.path()], &[] as &[&Path]);
        assert_eq!(reg.filter("BETA", false, false).len(), 1);
        assert_eq!(reg.filter("dejavu", false, false).len(), 2);
        assert_eq!(reg.filter("", false, false).len(), 2);
    }

    #[test]
    fn test_export_font_list() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write_font(tmp.path(), "Alpha.ttf");
        let mut reg = FontRegistry::default();
        reg.add_path(&p).unwrap();
        reg.set_note(&p, "note here").unwrap();
        let out = tmp.path().join("fonts.txt");
        assert_eq!(reg.export_font_list(&out).unwrap(), 1);
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.starts_with("Font List\n"));
        assert!(text.contains("File: Alpha.ttf"));
        assert!(text.contains("Note: note here"));
    }
}
