//! User-defined font categories.
//!
//! Categories are keyed by label and kept sorted by it. A category stores
//! font paths, not records, so a member can outlive its registry entry and
//! show up as missing.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CategoryError;
use crate::registry::FontRegistry;
use crate::render::{self, RenderOptions, TextColor};

pub const ICON_SIZE: u32 = 64;
pub const PREVIEW_TEXT: &str = "The quick brown fox";
const NO_INFO: &str = "Not available.";
const NO_LICENSE: &str = "Not available";

fn default_label() -> String {
    "Unnamed Category".into()
}
fn default_idx() -> String {
    uuid::Uuid::new_v4().to_string()
}
fn default_preview_font_size() -> u32 {
    24
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default = "default_idx")]
    pub idx: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub image_path: String,
    #[serde(default)]
    pub fonts_list: Vec<PathBuf>,
    #[serde(default)]
    pub user_note: String,
    #[serde(default)]
    pub font_info: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub is_installed: bool,
    /// File name inside the icons directory.
    #[serde(default)]
    pub category_icon_file: String,
    /// Always written as `null`; the rendered preview is rebuilt on load.
    #[serde(default, skip_deserializing)]
    preview_image: Option<()>,
    #[serde(default)]
    pub preview_image_size: (u32, u32),
    #[serde(default = "default_preview_font_size")]
    pub preview_font_size: u32,
    #[serde(skip)]
    pub preview: Option<RgbaImage>,
}

impl Category {
    pub fn new(label: &str) -> Self {
        Self {
            idx: default_idx(),
            label: label.to_string(),
            image_path: String::new(),
            fonts_list: Vec::new(),
            user_note: String::new(),
            font_info: String::new(),
            license: String::new(),
            is_installed: false,
            category_icon_file: String::new(),
            preview_image: None,
            preview_image_size: (0, 0),
            preview_font_size: default_preview_font_size(),
            preview: None,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.fonts_list.iter().any(|p| p == path)
    }

    /// Absolute icon path, if one is set.
    pub fn icon_path(&self, icons_dir: &Path) -> Option<PathBuf> {
        (!self.category_icon_file.is_empty()).then(|| icons_dir.join(&self.category_icon_file))
    }

    /// Aggregate descriptions and licenses of the registered members.
    fn aggregate(&mut self, registry: &FontRegistry) {
        let mut descriptions = Vec::new();
        let mut licenses: Vec<&str> = Vec::new();
        for record in self.fonts_list.iter().filter_map(|p| registry.get_by_path(p)) {
            if !record.font_info.is_empty() {
                descriptions.push(record.font_info.as_str());
            }
            if !record.license.is_empty() && !licenses.contains(&record.license.as_str()) {
                licenses.push(&record.license);
            }
        }
        self.font_info = if descriptions.is_empty() {
            NO_INFO.to_string()
        } else {
            descriptions.join("\n")
        };
        self.license = if licenses.is_empty() {
            NO_LICENSE.to_string()
        } else {
            licenses.join("\n")
        };
    }
}

// ─── STORE ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CategoryStore {
    categories: BTreeMap<String, Category>,
}

/// Accepts the label-keyed map and the older list form.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCategories {
    Map(BTreeMap<String, Category>),
    List(Vec<Category>),
}

impl<'de> Deserialize<'de> for CategoryStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let categories = match StoredCategories::deserialize(deserializer)? {
            StoredCategories::Map(map) => map
                .into_iter()
                .map(|(label, mut cat)| {
                    cat.label.clone_from(&label);
                    (label, cat)
                })
                .collect(),
            StoredCategories::List(list) => {
                list.into_iter().map(|c| (c.label.clone(), c)).collect()
            }
        };
        Ok(Self { categories })
    }
}

impl CategoryStore {
    pub fn get(&self, label: &str) -> Option<&Category> {
        self.categories.get(label)
    }

    pub fn get_mut(&mut self, label: &str) -> Result<&mut Category, CategoryError> {
        self.categories
            .get_mut(label)
            .ok_or_else(|| CategoryError::NotFound(label.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Category> {
        self.categories.values_mut()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn checked_label(&self, label: &str) -> Result<String, CategoryError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(CategoryError::EmptyLabel);
        }
        if self.categories.contains_key(label) {
            return Err(CategoryError::AlreadyExists(label.to_string()));
        }
        Ok(label.to_string())
    }

    pub fn add(&mut self, label: &str) -> Result<&Category, CategoryError> {
        let label = self.checked_label(label)?;
        tracing::info!("Category '{label}' created");
        Ok(self
            .categories
            .entry(label.clone())
            .or_insert_with(|| Category::new(&label)))
    }

    /// Rename keeping id, members and every other field.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), CategoryError> {
        if !self.categories.contains_key(old) {
            return Err(CategoryError::NotFound(old.to_string()));
        }
        let new = self.checked_label(new)?;
        let Some(mut cat) = self.categories.remove(old) else {
            return Err(CategoryError::NotFound(old.to_string()));
        };
        cat.label.clone_from(&new);
        tracing::info!("Category '{old}' renamed to '{new}'");
        self.categories.insert(new, cat);
        Ok(())
    }

    pub fn delete(&mut self, label: &str) -> Result<Category, CategoryError> {
        let cat = self
            .categories
            .remove(label)
            .ok_or_else(|| CategoryError::NotFound(label.to_string()))?;
        tracing::info!("Category '{label}' deleted");
        Ok(cat)
    }

    /// Add paths not already in the category; returns how many were new.
    pub fn assign<I>(&mut self, label: &str, paths: I) -> Result<usize, CategoryError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let cat = self.get_mut(label)?;
        let mut added = 0;
        for path in paths {
            if !cat.contains(&path) {
                cat.fonts_list.push(path);
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn remove_font(&mut self, label: &str, path: &Path) -> Result<(), CategoryError> {
        let cat = self.get_mut(label)?;
        let pos = cat
            .fonts_list
            .iter()
            .position(|p| p == path)
            .ok_or_else(|| CategoryError::NotMember {
                label: label.to_string(),
                font: path.display().to_string(),
            })?;
        cat.fonts_list.remove(pos);
        Ok(())
    }

    pub fn set_note(&mut self, label: &str, note: &str) -> Result<(), CategoryError> {
        self.get_mut(label)?.user_note = note.trim().to_string();
        Ok(())
    }

    pub fn refresh_info(&mut self, label: &str, registry: &FontRegistry) -> Result<(), CategoryError> {
        self.get_mut(label)?.aggregate(registry);
        Ok(())
    }

    /// Render the sample line with the first registered member.
    pub fn refresh_preview(
        &mut self,
        label: &str,
        registry: &FontRegistry,
    ) -> Result<(), CategoryError> {
        let cat = self.get_mut(label)?;
        cat.preview = None;
        let Some(record) = cat.fonts_list.first().and_then(|p| registry.get_by_path(p)) else {
            return Ok(());
        };
        let opts = RenderOptions {
            size: cat.preview_font_size,
            color: TextColor::BLACK,
            ..RenderOptions::default()
        };
        match render::render_text(&record.font_path, PREVIEW_TEXT, &opts) {
            Ok(rendered) => {
                cat.preview_image_size = rendered.image.dimensions();
                cat.preview = Some(rendered.image);
            }
            Err(e) => tracing::error!("Preview for '{label}' failed: {e}"),
        }
        Ok(())
    }

    /// Refresh aggregated metadata and previews of every category.
    pub fn refresh_all(&mut self, registry: &FontRegistry) {
        let labels: Vec<String> = self.categories.keys().cloned().collect();
        for label in labels {
            if let Err(e) = self
                .refresh_info(&label, registry)
                .and_then(|()| self.refresh_preview(&label, registry))
            {
                tracing::warn!("Refreshing '{label}' failed: {e}");
            }
        }
    }

    /// Store `file` as the category icon, scaled to 64x64 PNG inside
    /// `icons_dir`. Files already inside `icons_dir` are used as they are.
    pub fn set_icon(
        &mut self,
        label: &str,
        file: &Path,
        icons_dir: &Path,
    ) -> Result<PathBuf, CategoryError> {
        if !self.categories.contains_key(label) {
            return Err(CategoryError::NotFound(label.to_string()));
        }
        if !file.is_file() {
            return Err(CategoryError::IconMissing(file.to_path_buf()));
        }
        let already_stored = file.parent().is_some_and(|dir| dir == icons_dir);
        let cat = self.get_mut(label)?;
        let target = if already_stored {
            file.to_path_buf()
        } else {
            std::fs::create_dir_all(icons_dir).map_err(|source| CategoryError::Io {
                path: icons_dir.to_path_buf(),
                source,
            })?;
            let target = icons_dir.join(format!("cat_icon_{}.png", cat.idx));
            let icon = image::open(file)?.to_rgba8();
            let icon = image::imageops::resize(&icon, ICON_SIZE, ICON_SIZE, FilterType::Lanczos3);
            icon.save(&target)?;
            target
        };
        cat.category_icon_file = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("Icon for '{label}' set to {}", target.display());
        Ok(target)
    }

    /// Members of `label` that are not in the registry.
    pub fn missing_fonts(
        &self,
        label: &str,
        registry: &FontRegistry,
    ) -> Result<Vec<PathBuf>, CategoryError> {
        let cat = self
            .get(label)
            .ok_or_else(|| CategoryError::NotFound(label.to_string()))?;
        Ok(cat
            .fonts_list
            .iter()
            .filter(|p| !registry.contains(p))
            .cloned()
            .collect())
    }

    pub fn category_list_text(&self) -> String {
        let mut out = String::new();
        for cat in self.categories.values() {
            let _ = writeln!(out, "\nCategory: {}", cat.label);
            out.push_str(&"-".repeat(50));
            out.push('\n');
            for path in &cat.fonts_list {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| path.to_string_lossy());
                let _ = writeln!(out, "  - {name}");
            }
        }
        out
    }

    pub fn export_category_list(&self, path: &Path) -> Result<usize, CategoryError> {
        std::fs::write(path, self.category_list_text()).map_err(|source| CategoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Category list exported to {}", path.display());
        Ok(self.categories.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEJAVU: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

    fn registry_with(dir: &Path, names: &[&str]) -> (FontRegistry, Vec<PathBuf>) {
        let mut reg = FontRegistry::default();
        let mut paths = Vec::new();
        for name in names {
            let p = dir.join(name);
            std::fs::write(&p, DEJAVU).unwrap();
            reg.add_path(&p).unwrap();
            paths.push(p);
        }
        (reg, paths)
    }

    #[test]
    fn test_add_validates_label() {
        let mut store = CategoryStore::default();
        assert!(matches!(store.add("   "), Err(CategoryError::EmptyLabel)));
        store.add("  Serif ").unwrap();
        assert!(store.get("Serif").is_some());
        assert!(matches!(store.add("Serif"), Err(CategoryError::AlreadyExists(_))));
    }

    #[test]
    fn test_labels_sorted() {
        let mut store = CategoryStore::default();
        for l in ["mono", "Display", "Serif"] {
            store.add(l).unwrap();
        }
        let labels: Vec<&str> = store.labels().collect();
        assert_eq!(labels, vec!["Display", "Serif", "mono"]);
    }

    #[test]
    fn test_assign_is_set_like() {
        let mut store = CategoryStore::default();
        store.add("Sans").unwrap();
        let a = PathBuf::from("/f/a.ttf");
        let b = PathBuf::from("/f/b.ttf");
        assert_eq!(store.assign("Sans", [a.clone(), b.clone()]).unwrap(), 2);
        assert_eq!(store.assign("Sans", [a.clone()]).unwrap(), 0);
        assert_eq!(store.get("Sans").unwrap().fonts_list, vec![a, b]);
        assert!(matches!(
            store.assign("Nope", []),
            Err(CategoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_font_errors() {
        let mut store = CategoryStore::default();
        store.add("Sans").unwrap();
        let a = PathBuf::from("/f/a.ttf");
        store.assign("Sans", [a.clone()]).unwrap();
        assert!(matches!(
            store.remove_font("Sans", Path::new("/f/zz.ttf")),
            Err(CategoryError::NotMember { .. })
        ));
        store.remove_font("Sans", &a).unwrap();
        assert!(store.get("Sans").unwrap().fonts_list.is_empty());
    }

    #[test]
    fn test_rename_keeps_identity() {
        let mut store = CategoryStore::default();
        store.add("Old").unwrap();
        store.add("Other").unwrap();
        store.assign("Old", [PathBuf::from("/f/a.ttf")]).unwrap();
        let idx = store.get("Old").unwrap().idx.clone();

        assert!(matches!(
            store.rename("Old", "Other"),
            Err(CategoryError::AlreadyExists(_))
        ));
        store.rename("Old", "New").unwrap();
        let cat = store.get("New").unwrap();
        assert_eq!(cat.idx, idx);
        assert_eq!(cat.label, "New");
        assert_eq!(cat.fonts_list.len(), 1);
        assert!(store.get("Old").is_none());
        assert!(store.delete("Old").is_err());
        assert_eq!(store.delete("New").unwrap().idx, idx);
    }

    #[test]
    fn test_refresh_info_aggregates() {
        let tmp = tempfile::tempdir().unwrap();
        let (reg, paths) = registry_with(tmp.path(), &["a.ttf", "b.ttf"]);
        let mut store = CategoryStore::default();
        store.add("Sans").unwrap();
        store.refresh_info("Sans", &reg).unwrap();
        assert_eq!(store.get("Sans").unwrap().font_info, "Not available.");
        assert_eq!(store.get("Sans").unwrap().license, "Not available");

        store.assign("Sans", paths).unwrap();
        store.refresh_info("Sans", &reg).unwrap();
        let cat = store.get("Sans").unwrap();
        assert_eq!(cat.font_info, "DejaVu Sans\nDejaVu Sans");
        // identical licenses collapse to one entry
        assert!(!cat.license.is_empty());
        assert_eq!(
            cat.license.lines().count(),
            reg.iter().next().unwrap().license.lines().count()
        );
    }

    #[test]
    fn test_missing_fonts_and_preview() {
        let tmp = tempfile::tempdir().unwrap();
        let (reg, paths) = registry_with(tmp.path(), &["a.ttf"]);
        let ghost = tmp.path().join("ghost.ttf");
        let mut store = CategoryStore::default();
        store.add("Mixed").unwrap();
        store
            .assign("Mixed", [paths[0].clone(), ghost.clone()])
            .unwrap();
        assert_eq!(store.missing_fonts("Mixed", &reg).unwrap(), vec![ghost]);

        store.refresh_preview("Mixed", &reg).unwrap();
        let cat = store.get("Mixed").unwrap();
        let preview = cat.preview.as_ref().unwrap();
        assert_eq!(preview.dimensions(), cat.preview_image_size);
        assert!(cat.preview_image_size.0 > 0);
    }

    #[test]
    fn test_set_icon_resizes_to_png() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("big.png");
        RgbaImage::from_pixel(200, 100, image::Rgba([255, 0, 0, 255]))
            .save(&src)
            .unwrap();
        let icons = tmp.path().join("icons");
        let mut store = CategoryStore::default();
        store.add("Red").unwrap();

        let target = store.set_icon("Red", &src, &icons).unwrap();
        let cat = store.get("Red").unwrap();
        assert_eq!(cat.category_icon_file, format!("cat_icon_{}.png", cat.idx));
        let icon = image::open(&target).unwrap();
        assert_eq!((icon.width(), icon.height()), (ICON_SIZE, ICON_SIZE));

        // re-selecting the stored icon does not copy it again
        let again = store.set_icon("Red", &target, &icons).unwrap();
        assert_eq!(again, target);
        assert!(matches!(
            store.set_icon("Red", &tmp.path().join("none.png"), &icons),
            Err(CategoryError::IconMissing(_))
        ));
    }

    #[test]
    fn test_json_map_and_legacy_list() {
        let mut store = CategoryStore::default();
        store.add("B").unwrap();
        store.add("A").unwrap();
        store.assign("A", [PathBuf::from("/f/a.ttf")]).unwrap();
        store.get_mut("A").unwrap().is_installed = true;

        let value = serde_json::to_value(&store).unwrap();
        assert!(value["A"]["preview_image"].is_null());
        assert_eq!(value["A"]["preview_font_size"], 24);
        let back: CategoryStore = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back, store);

        let list = serde_json::json!([value["A"], {"label": "C"}]);
        let legacy: CategoryStore = serde_json::from_value(list).unwrap();
        let labels: Vec<&str> = legacy.labels().collect();
        assert_eq!(labels, vec!["A", "C"]);
        assert!(legacy.get("A").unwrap().is_installed);
        assert_eq!(legacy.get("C").unwrap().preview_font_size, 24);
    }

    #[test]
    fn test_export_category_list() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = CategoryStore::default();
        store.add("Sans").unwrap();
        store.assign("Sans", [PathBuf::from("/f/a.ttf")]).unwrap();
        let out = tmp.path().join("cats.txt");
        assert_eq!(store.export_category_list(&out).unwrap(), 1);
        let text = std::fs::read_to_string(out).unwrap();
        assert!(text.contains("Category: Sans"));
        assert!(text.contains("  - a.ttf"));
    }
}
