use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::core::config::CONFIG_FILE;

/// Files whose presence at the script root marks it as a site root when the
/// server is mounted below the web server's own document root.
const MOUNT_MARKERS: [&str; 2] = [CONFIG_FILE, ".htaccess"];

/// The resolved document root, request path and base URL for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
  pub doc_root: PathBuf,
  /// Normalized request path, always with a leading slash.
  pub request_path: String,
  /// URL prefix the site is mounted under. Starts and ends with `/`.
  pub base_url: String,
}

/// Cleans up a local resource path: back-slashes become forward slashes,
/// runs of slashes collapse to one, runs of dots collapse to a single dot
/// (defends against traversal without breaking legitimate multi-dot names).
pub fn clean_path(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  for c in path.chars() {
    let c = if c == '\\' { '/' } else { c };
    if (c == '/' || c == '.') && out.ends_with(c) {
      continue;
    }
    out.push(c);
  }
  out
}

/// Percent-decodes a raw request URI, drops the query string and normalizes
/// the remaining path.
pub fn normalize_request_uri(raw: &str) -> String {
  let decoded = percent_decode_str(raw).decode_utf8_lossy();
  let path = decoded.split('?').next().unwrap_or("");
  let cleaned = clean_path(path);
  if cleaned.starts_with('/') {
    cleaned
  } else {
    format!("/{cleaned}")
  }
}

/// Derives the document root, request path and base URL for a request.
///
/// The simple case trusts the document root it was given. When the script
/// root differs from the document root and carries a marker file, the site is
/// assumed to be mounted in a sub-folder: for a script root of `/a/b/c` we
/// try to strip `/c`, then `/b/c`, then `/a/b/c` from the start of the
/// request path, and the longest matching prefix wins as the mount base.
pub fn resolve_mount(doc_root: &Path, script_root: &Path, raw_uri: &str) -> Mount {
  let request_path = normalize_request_uri(raw_uri);

  let mut mount = Mount {
    doc_root: doc_root.to_path_buf(),
    request_path: request_path.clone(),
    base_url: "/".to_string(),
  };

  let marked = MOUNT_MARKERS.iter().any(|m| script_root.join(m).exists());
  if script_root != doc_root && marked {
    let script = clean_path(&script_root.to_string_lossy());
    let parts: Vec<&str> = script.split('/').filter(|s| !s.is_empty()).collect();

    let mut trimmed = request_path.clone();
    let mut base_url = "/".to_string();
    for take in 1..=parts.len() {
      let prefix = format!("/{}", parts[parts.len() - take..].join("/"));
      if let Some(rest) = request_path.strip_prefix(&prefix) {
        trimmed = rest.to_string();
        base_url = format!("{prefix}/");
      }
    }
    if trimmed.is_empty() {
      trimmed = "/".to_string();
    }

    mount.doc_root = script_root.to_path_buf();
    mount.request_path = trimmed;
    mount.base_url = base_url;
  }

  mount
}
