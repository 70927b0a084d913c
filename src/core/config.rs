use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{JinjetError, Result};

/// Name of the optional site config file, looked up at the document root.
pub const CONFIG_FILE: &str = "jinjet.json";

/// User configuration for one site, read from `jinjet.json`.
///
/// Unknown keys are ignored. A missing file yields the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
  /// Engine debug mode (the `debug` template helper and friends).
  pub debug: bool,
  /// HTML-autoescape every rendered template.
  pub autoescape: bool,
  /// Error out on undefined template variables.
  pub strict_variables: bool,
  /// Charset advertised for text-like responses.
  pub charset: String,
  /// Accepted for compatibility and ignored: the engine lives for a single
  /// request, so there is nothing to cache across requests.
  pub cache: Option<serde_json::Value>,
  /// Extra global variables merged into every template's scope.
  pub globals: serde_json::Map<String, serde_json::Value>,
  /// Named alternate template search roots. `./`-prefixed paths are
  /// resolved against the document root.
  pub namespaces: BTreeMap<String, String>,
  /// Optional allow-list of filename glob patterns. When set, a file must
  /// match at least one pattern to be served.
  pub allow_only: Option<Vec<String>>,
  /// When false, directory browsing, source views and verbose error pages
  /// are disabled and errors degrade to a minimal output.
  pub debug_mode: bool,
}

impl Default for SiteConfig {
  fn default() -> Self {
    Self {
      debug: true,
      autoescape: true,
      strict_variables: true,
      charset: "utf-8".to_string(),
      cache: None,
      globals: serde_json::Map::new(),
      namespaces: BTreeMap::new(),
      allow_only: None,
      debug_mode: true,
    }
  }
}

/// Reads the site config from `<doc_root>/jinjet.json`.
///
/// A missing file is fine and yields defaults; a file that exists but does
/// not parse is fatal for the whole request.
pub fn load(doc_root: &Path) -> Result<SiteConfig> {
  let file = doc_root.join(CONFIG_FILE);
  if !file.is_file() {
    return Ok(SiteConfig::default());
  }
  let text = fs::read_to_string(&file)?;
  serde_json::from_str(&text).map_err(|err| JinjetError::BadConfig {
    file,
    message: err.to_string(),
  })
}

/// Validates the configured namespaces and resolves them to directories.
///
/// `./`-prefixed paths are taken relative to the document root, everything
/// else is treated as absolute. A namespace that is not a directory is fatal,
/// halting before any user content renders.
pub fn resolve_namespaces(config: &SiteConfig, doc_root: &Path) -> Result<BTreeMap<String, PathBuf>> {
  let mut valid = BTreeMap::new();
  for (name, path) in &config.namespaces {
    let resolved = match path.strip_prefix("./") {
      Some(rel) => doc_root.join(rel),
      None => PathBuf::from(path),
    };
    if !resolved.is_dir() {
      return Err(JinjetError::BadNamespace {
        name: name.clone(),
        path: resolved,
      });
    }
    valid.insert(name.clone(), resolved);
  }
  Ok(valid)
}
