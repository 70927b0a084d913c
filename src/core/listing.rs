use std::path::Path;

use glob::MatchOptions;
use serde::Serialize;

use crate::core::locate::{RENDER_EXTS, allow_file};
use crate::core::paths::clean_path;

/// What `glob_names` should keep from the expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  File,
  Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DirEntry {
  pub name: String,
  pub url: String,
}

/// A filtered directory listing, partitioned into files and directories.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Listing {
  pub files: Vec<DirEntry>,
  pub dirs: Vec<DirEntry>,
  /// Set to "Empty directory" when both partitions come out empty.
  pub message: String,
}

/// Expands glob patterns non-recursively from `root` and returns matching
/// names, root-relative, trailing slash stripped, sorted ascending.
///
/// Empty patterns and patterns containing `..` are silently dropped, as are
/// results that somehow escape `root`.
pub fn glob_names(patterns: &[String], root: &Path, kind: EntryKind) -> Vec<String> {
  let options = MatchOptions {
    // `*` should not pick up dotfiles
    require_literal_leading_dot: true,
    ..MatchOptions::new()
  };
  let mut names = Vec::new();
  for pattern in patterns {
    let pattern = pattern.trim_start_matches(['\\', '/']);
    if pattern.is_empty() || pattern.contains("..") {
      continue;
    }
    let full = format!("{}/{}", root.display(), pattern);
    let Ok(paths) = glob::glob_with(&full, options) else {
      continue;
    };
    for path in paths.flatten() {
      let keep = match kind {
        EntryKind::File => path.is_file(),
        EntryKind::Dir => path.is_dir(),
      };
      if !keep {
        continue;
      }
      let Ok(rel) = path.strip_prefix(root) else {
        continue;
      };
      let name = clean_path(&rel.to_string_lossy());
      names.push(name.trim_end_matches('/').to_string());
    }
  }
  names.sort();
  names
}

fn lower_ext(name: &str) -> String {
  name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default()
}

fn stem(name: &str) -> &str {
  name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name)
}

/// Enumerates a directory for listing mode.
///
/// Dotfiles and deny-set matches are removed (the configurable allow-list is
/// never consulted here). Files carrying a render extension advertise an
/// extension-stripped URL so that following the link serves the rendered
/// page rather than the raw source.
pub fn list_dir(dir: &Path, base_url: &str, request_path: &str) -> Listing {
  // The joined URL can end up with doubled slashes, collapsed here
  let base = clean_path(&format!("{base_url}/{request_path}/"));
  let pattern = vec!["*".to_string()];

  let mut files = Vec::new();
  for name in glob_names(&pattern, dir, EntryKind::File) {
    if name.starts_with('.') || !allow_file(&name, None) {
      continue;
    }
    let url = if RENDER_EXTS.contains(&lower_ext(&name).as_str()) {
      format!("{base}{}", stem(&name))
    } else {
      format!("{base}{name}")
    };
    files.push(DirEntry { name, url });
  }

  let mut dirs = Vec::new();
  for name in glob_names(&pattern, dir, EntryKind::Dir) {
    if name.starts_with('.') {
      continue;
    }
    dirs.push(DirEntry {
      url: format!("{base}{name}"),
      name,
    });
  }

  let message = if files.is_empty() && dirs.is_empty() {
    "Empty directory".to_string()
  } else {
    String::new()
  };
  Listing { files, dirs, message }
}
