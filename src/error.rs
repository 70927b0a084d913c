use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for `jinjet` operations.
pub type Result<T, E = JinjetError> = std::result::Result<T, E>;

/// The primary error type for all `jinjet` operations.
#[derive(Debug, Error)]
pub enum JinjetError {
  /// The site config file exists but is not valid JSON.
  #[error("could not parse {}: {message}", file.display())]
  BadConfig { file: PathBuf, message: String },

  /// A configured template namespace does not point to a directory.
  #[error("bad template namespace \"{name}\": {} is not a directory", path.display())]
  BadNamespace { name: String, path: PathBuf },

  /// An error originating from the template engine.
  #[error("template error: {0}")]
  Render(#[from] minijinja::Error),

  /// An I/O error, typically from reading an already-located file.
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
}
