use std::path::Path;

use serde::Serialize;

use crate::core::locate::{INDEX_FILES, RENDER_EXTS, allow_file};

/// One navigation crumb. `ext` marks the separately clickable extension
/// crumb emitted for renderable files.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Crumb {
  pub url: String,
  pub name: String,
  pub active: bool,
  pub ext: bool,
}

/// Page title and breadcrumb trail for the current request.
#[derive(Debug, Clone, Serialize, Default)]
pub struct NavInfo {
  pub title: String,
  pub crumbs: Vec<Crumb>,
}

/// Doc-root folder name used as the site label; short names get the parent
/// folder prepended so the label stays recognizable.
pub fn site_label(doc_root: &Path) -> String {
  let folder = doc_root
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  if folder.len() > 5 {
    return folder;
  }
  let parent = doc_root
    .parent()
    .and_then(|p| p.file_name())
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  if parent.is_empty() {
    folder
  } else {
    format!("{parent}:{folder}")
  }
}

fn lower_ext(name: &str) -> String {
  name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default()
}

fn stem(name: &str) -> &str {
  name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name)
}

/// Derives a page title and breadcrumb trail from the request path and the
/// resolved file.
///
/// A root crumb is always present. When the resolved file is renderable, the
/// final path fragment splits into a stem crumb and a clickable `.ext`
/// crumb; the active marker sits on the `.ext` crumb when the request URL
/// spelled the extension out, and one crumb earlier when it did not, so both
/// the clean URL and the extension-bearing URL highlight sensibly. Exactly
/// one crumb is active whenever the trail is non-empty.
pub fn build(
  doc_root: &Path,
  base_url: &str,
  request_path: &str,
  real_path: Option<&Path>,
  allow_only: Option<&[String]>,
  debug_mode: bool,
) -> NavInfo {
  let path = request_path.trim_matches('/');
  let path_basename = path.rsplit('/').next().unwrap_or("");
  let label = site_label(doc_root);

  // Restrict the information we hand out when browsing is disabled
  if !debug_mode {
    return NavInfo {
      title: path_basename.to_string(),
      crumbs: Vec::new(),
    };
  }

  let real_name = real_path
    .and_then(|p| p.file_name())
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();

  let mut url = base_url.to_string();
  let mut crumbs = vec![Crumb {
    url: url.clone(),
    name: label.clone(),
    active: false,
    ext: false,
  }];

  let mut fragments: Vec<&str> = path.split('/').filter(|f| !f.is_empty()).collect();
  // Serving an index file for a URL that only names the directory: the
  // index filename becomes the final crumb.
  let last = if INDEX_FILES.contains(&real_name.as_str()) && stem(path_basename) != "index" {
    real_name.clone()
  } else {
    fragments.pop().unwrap_or_default().to_string()
  };

  for fragment in &fragments {
    url.push_str(fragment);
    url.push('/');
    crumbs.push(Crumb {
      url: url.clone(),
      name: fragment.to_string(),
      active: false,
      ext: false,
    });
  }

  let mut active = crumbs.len() - 1;
  if !last.is_empty() {
    let path_ext = lower_ext(path_basename);
    let real_ext = lower_ext(&real_name);
    if !real_name.is_empty()
      && RENDER_EXTS.contains(&real_ext.as_str())
      && allow_file(&real_name, allow_only)
    {
      active += if real_ext == path_ext { 2 } else { 1 };
      let real_stem = stem(&real_name);
      crumbs.push(Crumb {
        url: format!("{url}{real_stem}"),
        name: real_stem.to_string(),
        active: false,
        ext: false,
      });
      crumbs.push(Crumb {
        url: format!("{url}{real_name}"),
        name: format!(".{real_ext}"),
        active: false,
        ext: true,
      });
    } else {
      active += 1;
      crumbs.push(Crumb {
        url: format!("{url}{last}"),
        name: last,
        active: false,
        ext: false,
      });
    }
  }
  for (index, crumb) in crumbs.iter_mut().enumerate() {
    crumb.active = index == active;
  }

  let title = if path_basename.is_empty() {
    label
  } else {
    format!("{path_basename} - {label}")
  };
  NavInfo { title, crumbs }
}
