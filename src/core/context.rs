use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::config::{self, SiteConfig};
use crate::core::paths;
use crate::error::JinjetError;

/// Everything known about one request. Built once per request, then only
/// read; nothing in here outlives the response.
#[derive(Debug)]
pub struct RequestContext {
  pub doc_root: PathBuf,
  /// Normalized request path with a leading slash and no traversal.
  pub request_path: String,
  /// Mount prefix, always starting and ending with `/`.
  pub base_url: String,
  pub config: SiteConfig,
  /// Validated template namespaces.
  pub namespaces: BTreeMap<String, PathBuf>,
  pub query: BTreeMap<String, String>,
  pub form: BTreeMap<String, String>,
  pub cookies: BTreeMap<String, String>,
  /// Config problem found while building the context. Forces a 500 before
  /// any user content renders.
  pub fatal: Option<JinjetError>,
}

impl RequestContext {
  /// Resolves the mount, loads and validates the site config, and captures
  /// the per-request input maps. Config problems are recorded rather than
  /// returned so that every request can still produce an error page.
  pub fn build(
    public_root: &Path,
    script_root: &Path,
    raw_uri: &str,
    query: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
  ) -> Self {
    let mount = paths::resolve_mount(public_root, script_root, raw_uri);

    let mut fatal = None;
    let config = match config::load(&mount.doc_root) {
      Ok(config) => config,
      Err(err) => {
        fatal = Some(err);
        SiteConfig::default()
      }
    };
    let namespaces = match config::resolve_namespaces(&config, &mount.doc_root) {
      Ok(namespaces) => namespaces,
      Err(err) => {
        fatal.get_or_insert(err);
        BTreeMap::new()
      }
    };

    Self {
      doc_root: mount.doc_root,
      request_path: mount.request_path,
      base_url: mount.base_url,
      config,
      namespaces,
      query,
      form,
      cookies,
      fatal,
    }
  }

  /// Shorthand for the common case: document root is the script root and
  /// the request carries no query, form or cookie data.
  pub fn for_root(root: &Path, raw_uri: &str) -> Self {
    Self::build(
      root,
      root,
      raw_uri,
      BTreeMap::new(),
      BTreeMap::new(),
      BTreeMap::new(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn config_errors_are_captured_not_lost() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(config::CONFIG_FILE), "{ nope").unwrap();

    let ctx = RequestContext::for_root(dir.path(), "/page");
    assert!(matches!(ctx.fatal, Some(JinjetError::BadConfig { .. })));
    // Defaults still present so an error page can render
    assert!(ctx.config.debug_mode);
  }

  #[test]
  fn bad_namespace_is_fatal_for_every_request() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(config::CONFIG_FILE),
      r#"{"namespaces": {"parts": "./missing"}}"#,
    )
    .unwrap();

    let ctx = RequestContext::for_root(dir.path(), "/");
    assert!(matches!(ctx.fatal, Some(JinjetError::BadNamespace { .. })));
    assert!(ctx.namespaces.is_empty());
  }

  #[test]
  fn normalizes_the_request_path() {
    let dir = tempdir().unwrap();
    let ctx = RequestContext::for_root(dir.path(), "/a//b/../c?x=1");
    assert_eq!(ctx.request_path, "/a/b/./c");
    assert_eq!(ctx.base_url, "/");
  }
}
