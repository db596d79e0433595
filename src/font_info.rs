//! Per-file font metadata read from the OpenType `name` table.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use swash::{FontRef, StringId};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const DEFAULT_STYLE: &str = "Regular";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_LICENSE: &str = "No license information available.";

/// Style names every record advertises.
pub fn font_styles() -> Vec<String> {
    ["Regular", "Bold", "Italic", "Bold Italic"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// One discovered font file. Identity is `font_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordJson", into = "RecordJson")]
pub struct FontRecord {
    pub id: String,
    pub font_path: PathBuf,
    pub font_file: String,
    pub font_name: String,
    pub font_style: String,
    pub user_note: String,
    pub license: String,
    pub font_info: String,
}

impl FontRecord {
    /// Build a record for `path`, reading names from the font when possible.
    /// Unreadable files still produce a record with placeholder metadata.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let font_path = crate::paths::expand(path);
        let font_file = file_name_of(&font_path);
        let meta = match std::fs::read(&font_path) {
            Ok(data) => NameTable::read(&data),
            Err(e) => {
                tracing::debug!("Cannot read {}: {e}", font_path.display());
                NameTable::default()
            }
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            font_path,
            font_file,
            font_name: meta.family.unwrap_or_else(|| UNKNOWN_NAME.into()),
            font_style: meta.subfamily.unwrap_or_else(|| DEFAULT_STYLE.into()),
            user_note: String::new(),
            license: meta.license.unwrap_or_else(|| NO_LICENSE.into()),
            font_info: meta.full_name.unwrap_or_else(|| NO_DESCRIPTION.into()),
        }
    }

    /// Lowercased file name, the key used for cross-directory dedup.
    pub fn file_key(&self) -> String {
        self.font_file.to_lowercase()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Default)]
struct NameTable {
    family: Option<String>,
    subfamily: Option<String>,
    full_name: Option<String>,
    license: Option<String>,
}

impl NameTable {
    fn read(data: &[u8]) -> Self {
        let Some(font) = FontRef::from_index(data, 0) else {
            return Self::default();
        };
        let lookup = |id: StringId| -> Option<String> {
            let value: String = font
                .localized_strings()
                .find_by_id(id, None)?
                .chars()
                .collect();
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        };
        Self {
            family: lookup(StringId::Family),
            subfamily: lookup(StringId::SubFamily),
            full_name: lookup(StringId::Full),
            license: lookup(StringId::License),
        }
    }
}

// ─── JSON FORM ──────────────────────────────────────────────────

/// Clipboard/interchange shape. `font_family` mirrors the style name and
/// `font_styles` is the fixed style list.
#[derive(Serialize, Deserialize)]
struct RecordJson {
    #[serde(default)]
    id: String,
    #[serde(default)]
    font_name: String,
    #[serde(default)]
    font_file: String,
    #[serde(default)]
    font_family: String,
    #[serde(default)]
    font_style: String,
    #[serde(default = "font_styles")]
    font_styles: Vec<String>,
    #[serde(default)]
    font_path: PathBuf,
    #[serde(default)]
    user_note: String,
    #[serde(default)]
    license: String,
    #[serde(default)]
    font_info: String,
}

impl From<FontRecord> for RecordJson {
    fn from(r: FontRecord) -> Self {
        Self {
            id: r.id,
            font_name: r.font_name,
            font_file: r.font_file,
            font_family: r.font_style.clone(),
            font_style: r.font_style,
            font_styles: font_styles(),
            font_path: r.font_path,
            user_note: r.user_note,
            license: r.license,
            font_info: r.font_info,
        }
    }
}

impl From<RecordJson> for FontRecord {
    fn from(j: RecordJson) -> Self {
        let font_file = if j.font_file.is_empty() {
            file_name_of(&j.font_path)
        } else {
            j.font_file
        };
        let font_style = if j.font_style.is_empty() {
            if j.font_family.is_empty() {
                DEFAULT_STYLE.to_string()
            } else {
                j.font_family
            }
        } else {
            j.font_style
        };
        Self {
            id: if j.id.is_empty() {
                uuid::Uuid::new_v4().to_string()
            } else {
                j.id
            },
            font_path: j.font_path,
            font_file,
            font_name: if j.font_name.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                j.font_name
            },
            font_style,
            user_note: j.user_note,
            license: j.license,
            font_info: j.font_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dejavu() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans.ttf")
    }

    #[test]
    fn test_from_path_reads_names() {
        let rec = FontRecord::from_path(dejavu());
        assert_eq!(rec.font_name, "DejaVu Sans");
        assert_eq!(rec.font_style, "Book");
        assert_eq!(rec.font_file, "DejaVuSans.ttf");
        assert!(rec.font_path.is_absolute());
        assert_eq!(rec.font_info, "DejaVu Sans");
        assert!(!rec.id.is_empty());
    }

    #[test]
    fn test_unreadable_file_gets_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("Broken.TTF");
        std::fs::write(&bogus, b"not a font").unwrap();
        let rec = FontRecord::from_path(&bogus);
        assert_eq!(rec.font_name, UNKNOWN_NAME);
        assert_eq!(rec.font_style, DEFAULT_STYLE);
        assert_eq!(rec.font_info, NO_DESCRIPTION);
        assert_eq!(rec.license, NO_LICENSE);
        assert_eq!(rec.file_key(), "broken.ttf");
    }

    #[test]
    fn test_json_shape_and_roundtrip() {
        let mut rec = FontRecord::from_path(dejavu());
        rec.user_note = "body text".into();
        let json = rec.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["font_family"], value["font_style"]);
        assert_eq!(value["font_styles"].as_array().unwrap().len(), 4);
        let back: FontRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_json_missing_fields_default() {
        let back: FontRecord =
            serde_json::from_str(r#"{"font_path": "/tmp/fonts/Foo.otf"}"#).unwrap();
        assert_eq!(back.font_file, "Foo.otf");
        assert_eq!(back.font_name, UNKNOWN_NAME);
        assert_eq!(back.font_style, DEFAULT_STYLE);
        assert!(!back.id.is_empty());
    }
}
