use std::ffi::OsString;
use std::path::{Path, PathBuf};

use glob::Pattern;

/// Extension of renderable templates.
pub const TEMPLATE_EXT: &str = "jinja";

/// Extensions of file types we can render. Order sets candidate priority.
pub const RENDER_EXTS: [&str; 3] = [TEMPLATE_EXT, "md", "markdown"];

/// Filenames probed for directory requests. Order sets priority; the
/// template index wins over the static one.
pub const INDEX_FILES: [&str; 2] = ["index.jinja", "index.html"];

/// Filename patterns that are never served. Not configurable, and not a
/// solid security measure: this is a local development tool.
const DENY_PATTERNS: [&str; 7] = [
  "jinjet.*",
  "*.php",
  "*.phar",
  "*.cgi",
  "*.sql",
  ".htaccess",
  ".htpasswd",
];

/// Extensions still served as plain files when debug mode is off.
const TEXT_EXTS: [&str; 4] = ["md", "mdown", "markdown", "txt"];

/// How a resolved path should be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
  /// Raw bytes with a guessed content type.
  File,
  /// Rendered template.
  Template,
  /// Rendered Markdown page.
  Markdown,
  /// Highlighted source view of a renderable file.
  Source,
  /// Directory listing.
  Dir,
  NotFound,
  Forbidden,
}

/// Outcome of resolving one request path.
///
/// `real_path` is `None` exactly when the mode is `NotFound` or `Forbidden`.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
  pub real_path: Option<PathBuf>,
  pub mode: RenderMode,
}

fn lower_ext(path: &Path) -> String {
  path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default()
}

fn with_appended_ext(path: &Path, ext: &str) -> PathBuf {
  let mut os = OsString::from(path.as_os_str());
  os.push(".");
  os.push(ext);
  PathBuf::from(os)
}

/// Classifies a request path into a render mode and a concrete target.
///
/// Directories tentatively resolve to a listing, overridden by the first
/// existing index candidate. Anything else probes the exact path first, then
/// the path with each render extension appended (skipping an extension the
/// path already carries). The first existing file wins; requesting a file
/// with its render extension spelled out yields the source view instead of
/// the rendered page.
pub fn locate(doc_root: &Path, request_path: &str) -> ResolvedTarget {
  let base = doc_root.join(request_path.trim_matches('/'));

  let mut real = None;
  let mut mode = RenderMode::NotFound;
  let mut candidates = Vec::new();
  // A directory request spells no extension, whatever the folder is named
  let mut path_ext = String::new();

  if base.is_dir() {
    // Might be overridden if one of the index candidates exists
    real = Some(base.clone());
    mode = RenderMode::Dir;
    for index in INDEX_FILES {
      candidates.push(base.join(index));
    }
  } else {
    path_ext = lower_ext(&base);
    candidates.push(base.clone());
    for ext in RENDER_EXTS {
      if path_ext != ext {
        candidates.push(with_appended_ext(&base, ext));
      }
    }
  }

  for candidate in candidates {
    if !candidate.is_file() {
      continue;
    }
    let real_ext = lower_ext(&candidate);
    mode = RenderMode::File;
    if RENDER_EXTS.contains(&real_ext.as_str()) {
      mode = if real_ext == path_ext {
        RenderMode::Source
      } else if real_ext == TEMPLATE_EXT {
        RenderMode::Template
      } else {
        RenderMode::Markdown
      };
    }
    real = Some(candidate);
    break;
  }

  ResolvedTarget { real_path: real, mode }
}

/// Checks a filename against the fixed deny set, then against the optional
/// configured allow-list. Matching is case-insensitive on the basename.
pub fn allow_file(filename: &str, allow_only: Option<&[String]>) -> bool {
  let name = filename
    .rsplit(['/', '\\'])
    .next()
    .unwrap_or(filename)
    .to_lowercase();
  for pattern in DENY_PATTERNS {
    if Pattern::new(pattern).map(|p| p.matches(&name)).unwrap_or(false) {
      return false;
    }
  }
  let Some(allowed) = allow_only else {
    return true;
  };
  allowed.iter().any(|p| {
    let p = p.trim();
    !p.is_empty() && Pattern::new(p).map(|p| p.matches(&name)).unwrap_or(false)
  })
}

/// Applies the access filter and the debug-mode downgrades to a resolved
/// target. Directory and not-found modes are exempt from the filter; the
/// invariant that error modes carry no path is restored at the end.
pub fn filter(target: ResolvedTarget, allow_only: Option<&[String]>, debug_mode: bool) -> ResolvedTarget {
  let mut mode = target.mode;
  let mut real = target.real_path;

  if !matches!(mode, RenderMode::Dir | RenderMode::NotFound) {
    let name = real
      .as_deref()
      .and_then(|p| p.file_name())
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    if !allow_file(&name, allow_only) {
      mode = RenderMode::Forbidden;
    }
  }

  if !debug_mode {
    let real_ext = real.as_deref().map(|p| lower_ext(p)).unwrap_or_default();
    if mode == RenderMode::Source {
      // Complete URLs for markdown/text keep working as plain downloads
      mode = if TEXT_EXTS.contains(&real_ext.as_str()) {
        RenderMode::File
      } else {
        RenderMode::NotFound
      };
    }
    if matches!(mode, RenderMode::Dir | RenderMode::Markdown) {
      mode = RenderMode::NotFound;
    }
  }

  if matches!(mode, RenderMode::NotFound | RenderMode::Forbidden) {
    real = None;
  }
  ResolvedTarget { real_path: real, mode }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
  }

  #[test]
  fn template_candidate_beats_markdown() {
    let dir = tempdir().unwrap();
    write(dir.path(), "page.md", "md");
    write(dir.path(), "page.jinja", "tpl");

    let target = locate(dir.path(), "/page");
    assert_eq!(target.mode, RenderMode::Template);
    assert_eq!(target.real_path.unwrap(), dir.path().join("page.jinja"));
  }

  #[test]
  fn template_index_beats_static_index() {
    let dir = tempdir().unwrap();
    write(dir.path(), "sub/index.html", "static");
    write(dir.path(), "sub/index.jinja", "tpl");

    let target = locate(dir.path(), "/sub/");
    assert_eq!(target.mode, RenderMode::Template);
    assert_eq!(target.real_path.unwrap(), dir.path().join("sub/index.jinja"));
  }

  #[test]
  fn explicit_extension_switches_to_source_view() {
    let dir = tempdir().unwrap();
    write(dir.path(), "page.jinja", "tpl");

    assert_eq!(locate(dir.path(), "/page").mode, RenderMode::Template);
    assert_eq!(locate(dir.path(), "/page.jinja").mode, RenderMode::Source);
  }

  #[test]
  fn directory_named_like_a_template_still_renders_its_index() {
    let dir = tempdir().unwrap();
    write(dir.path(), "gallery.jinja/index.jinja", "tpl");

    let target = locate(dir.path(), "/gallery.jinja/");
    assert_eq!(target.mode, RenderMode::Template);
    assert_eq!(
      target.real_path.unwrap(),
      dir.path().join("gallery.jinja/index.jinja")
    );
  }

  #[test]
  fn miss_is_not_found_without_a_path() {
    let dir = tempdir().unwrap();
    let target = locate(dir.path(), "/nothing/here");
    assert_eq!(target.mode, RenderMode::NotFound);
    assert!(target.real_path.is_none());
  }

  #[test]
  fn directory_without_index_lists() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    let target = locate(dir.path(), "/docs");
    assert_eq!(target.mode, RenderMode::Dir);
    assert!(target.real_path.is_some());
  }

  #[test]
  fn deny_set_always_applies() {
    assert!(!allow_file("jinjet.json", None));
    assert!(!allow_file(".htaccess", None));
    assert!(!allow_file("dump.SQL", None));
    assert!(allow_file("page.jinja", None));
  }

  #[test]
  fn allow_list_restricts_everything_else() {
    let allow = vec!["*.html".to_string()];
    assert!(allow_file("a.html", Some(&allow)));
    assert!(!allow_file("a.css", Some(&allow)));
  }

  #[test]
  fn filter_clears_path_on_forbidden() {
    let dir = tempdir().unwrap();
    write(dir.path(), "jinjet.json", "{}");
    let target = locate(dir.path(), "/jinjet.json");
    let filtered = filter(target, None, true);
    assert_eq!(filtered.mode, RenderMode::Forbidden);
    assert!(filtered.real_path.is_none());
  }

  #[test]
  fn debug_mode_off_downgrades_browsing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "notes.md", "# hi");
    fs::create_dir(dir.path().join("docs")).unwrap();

    let md = filter(locate(dir.path(), "/notes"), None, false);
    assert_eq!(md.mode, RenderMode::NotFound);

    let source = filter(locate(dir.path(), "/notes.md"), None, false);
    assert_eq!(source.mode, RenderMode::File);

    let listing = filter(locate(dir.path(), "/docs"), None, false);
    assert_eq!(listing.mode, RenderMode::NotFound);
  }
}
