use serde::Serialize;

use crate::core::listing::DirEntry;

/// Name the internal layout template is registered under. The `@` prefix
/// keeps it out of the user's template namespace.
pub const LAYOUT_NAME: &str = "@jinjet/layout.jinja";

/// Source of the internal layout page, compiled into the binary so the tool
/// works from any directory.
pub const LAYOUT_SOURCE: &str = include_str!("../../tpl/layout.jinja");

/// Stylesheet inlined into the layout page.
pub const LAYOUT_CSS: &str = include_str!("../../tpl/styles.css");

/// Everything the internal layout page (directory listings, source views,
/// error pages) can display. Fields that hold pre-rendered HTML (`message`,
/// `content`, `code`) are piped through `safe` by the layout itself.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PageData {
  pub meta_title: String,
  pub title: String,
  pub message: String,
  pub content: String,
  pub code: String,
  pub code_lang: String,
  pub error: String,
  pub nav_border: bool,
  pub file_list: Vec<DirEntry>,
  pub dir_list: Vec<DirEntry>,
}

impl PageData {
  pub fn titled(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      nav_border: true,
      ..Self::default()
    }
  }
}
