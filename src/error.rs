//! Typed error variants for every subsystem.
//!
//! UI handlers return [`AppError`]; `update` catches it at the handler
//! boundary, logs it and shows it in a dialog.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the glyph rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Font file not found: {}", .0.display())]
    FontNotFound(PathBuf),

    #[error("Failed to read font file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a usable font face: {}", .0.display())]
    InvalidFont(PathBuf),

    #[error("Bitmap width {0} must be a multiple of 3 for LCD rendering")]
    LcdWidth(usize),

    #[error("Invalid pitch {pitch} for LCD bitmap of width {width}")]
    LcdPitch { pitch: usize, width: usize },

    #[error("Buffer size {actual} smaller than expected {expected}")]
    BufferTooSmall { actual: usize, expected: usize },

    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("The path {} does not exist", .0.display())]
    InvalidPath(PathBuf),

    #[error("Path already added: {}", .0.display())]
    DuplicatePath(PathBuf),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category name cannot be empty")]
    EmptyLabel,

    #[error("Category '{0}' already exists")]
    AlreadyExists(String),

    #[error("Category '{0}' does not exist")]
    NotFound(String),

    #[error("Font '{font}' is not associated with category '{label}'")]
    NotMember { label: String, font: String },

    #[error("Icon file does not exist: {}", .0.display())]
    IconMissing(PathBuf),

    #[error("Failed to process icon image: {0}")]
    Icon(#[from] image::ImageError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Cannot create install directory {}: {source}", path.display())]
    InstallDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Font cache rebuild failed ({status}):\n{stderr}")]
    CacheRebuild { status: String, stderr: String },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid state file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),

    #[error("Clipboard does not contain any font path")]
    Empty,

    #[error("Failed to encode font record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Top-level error for UI command handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error("Cannot change the log level")]
    Logging(#[from] tracing_subscriber::reload::Error),

    #[error("{0}")]
    Selection(&'static str),
}

impl AppError {
    /// Dialog title for this error class.
    pub fn title(&self) -> &'static str {
        match self {
            AppError::Render(_) => "Render Error",
            AppError::Registry(_) => "Font Path Error",
            AppError::Category(_) => "Category Error",
            AppError::Install(_) => "Installation Error",
            AppError::State(_) => "State Error",
            AppError::Clipboard(_) => "Clipboard Error",
            AppError::Logging(_) => "Logging Error",
            AppError::Selection(_) => "Selection Error",
        }
    }

    /// Selection and not-found errors are warnings, everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AppError::Selection(_)
                | AppError::Category(CategoryError::NotFound(_))
                | AppError::Category(CategoryError::NotMember { .. })
                | AppError::Category(CategoryError::EmptyLabel)
                | AppError::Category(CategoryError::AlreadyExists(_))
                | AppError::Registry(RegistryError::InvalidPath(_))
                | AppError::Registry(RegistryError::DuplicatePath(_))
                | AppError::Registry(RegistryError::FontNotFound(_))
                | AppError::Clipboard(ClipboardError::Empty)
        )
    }
}

/// Render an error with its full `source()` chain, one cause per line.
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(cause) = cur {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        cur = cause.source();
    }
    out
}
