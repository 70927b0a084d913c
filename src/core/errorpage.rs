use crate::core::locate::TEMPLATE_EXT;
use crate::core::page::PageData;

/// Default number of context lines shown on each side of a faulty line.
pub const EXCERPT_WINDOW: usize = 4;

/// Minimal HTML escaping for code excerpts and fallback pages.
pub fn escape_html(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

/// Formats a block of source code for an HTML page: escaped, split into
/// lines, optionally numbered, with one line marked.
///
/// When `highlight` is non-zero (1-indexed), only a symmetric window of
/// `window` lines around it is retained, clipped to the file bounds.
pub fn format_code_block(code: &str, numbers: bool, highlight: usize, window: usize) -> String {
  let escaped = escape_html(code).replace("\r\n", "\n");
  let lines: Vec<&str> = escaped.split('\n').collect();

  // 1-indexed bounds
  let mut start = 1;
  let mut end = lines.len();
  let highlight = highlight.min(end);
  if highlight > 0 {
    start = highlight.saturating_sub(window).max(1);
    end = (highlight + window).min(lines.len());
  }

  let mut excerpt = Vec::with_capacity(end - start + 1);
  for (offset, text) in lines[start - 1..end].iter().enumerate() {
    let number = start + offset;
    let mut row = String::new();
    // No number on a trailing empty line
    if numbers && (number < end || !text.is_empty()) {
      row.push_str(&format!("<span data-num=\"{number}\"></span>"));
    }
    if number == highlight {
      row.push_str(&format!("<mark>{text}</mark>"));
    } else {
      row.push_str(text);
    }
    excerpt.push(row);
  }
  excerpt.join("\n")
}

/// Maps a filename to the syntax-highlighting language tag used by the
/// layout page, ignoring a trailing template extension.
pub fn highlight_language(filename: &str) -> &'static str {
  let lower = filename.to_lowercase();
  let bare = lower.strip_suffix(&format!(".{TEMPLATE_EXT}")).unwrap_or(&lower);
  let ext = bare.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
  match ext {
    "json" => "json",
    "js" => "javascript",
    "css" => "css",
    "md" | "mdown" | "markdown" => "markdown",
    // xml, html, htm and everything unknown
    _ => "xml",
  }
}

const MINIMAL_BLOCKS: [(&str, &str); 5] = [
  ("title", "h1"),
  ("message", "blockquote"),
  ("content", "div"),
  ("code", "pre"),
  ("error", "pre"),
];

/// Last-resort plain HTML page, used when the layout page itself fails to
/// render. Straight string concatenation over a fixed tag map; this is the
/// floor of the failure model and cannot itself fail.
pub fn minimal_page(data: &PageData) -> String {
  let mut html = String::new();
  for (field, tag) in MINIMAL_BLOCKS {
    let content = match field {
      "title" => &data.title,
      "message" => &data.message,
      "content" => &data.content,
      "code" => &data.code,
      _ => &data.error,
    };
    if content.is_empty() {
      continue;
    }
    if tag == "pre" {
      html.push_str("<pre style=\"white-space:pre-wrap\">");
    } else {
      html.push_str(&format!("<{tag}>"));
    }
    html.push_str(content);
    html.push_str(&format!("</{tag}>\n"));
  }
  html
}

/// Stripped-down error page served when debug mode is off.
pub fn limited_page(status: u16, request_path: &str) -> String {
  let path = if request_path == "/" {
    request_path
  } else {
    request_path.trim_end_matches('/')
  };
  let path = escape_html(path);
  let message = if status == 500 { "Error" } else { "File not found" };
  format!(
    "<title>{status} - {path}</title><style>\
     body{{display:flex;height:100%;margin:0;align-items:center;color:#222;background:#eee}}\
     p{{width:100%;margin:0;padding:2em;text-align:center;font-family:sans-serif}}\
     code{{display:block;padding:.5em;font-family:monospace,monospace;font-size:120%;color:#A00}}\
     </style><body><p>{message}<br><code>{path}</code></p></body>"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn numbered_lines(html: &str) -> Vec<usize> {
    html
      .lines()
      .filter_map(|l| {
        let rest = l.split("data-num=\"").nth(1)?;
        rest.split('"').next()?.parse().ok()
      })
      .collect()
  }

  #[test]
  fn window_is_symmetric_and_clipped() {
    let code: String = (1..=30).map(|i| format!("line {i}\n")).collect();
    let html = format_code_block(code.trim_end(), true, 10, 4);
    assert_eq!(numbered_lines(&html), (6..=14).collect::<Vec<_>>());
    assert!(html.contains("<mark>line 10</mark>"));
  }

  #[test]
  fn window_clips_at_file_start_and_end() {
    let code = "a\nb\nc\nd\ne";
    let top = format_code_block(code, true, 1, 4);
    assert_eq!(numbered_lines(&top), vec![1, 2, 3, 4, 5]);

    let bottom = format_code_block(code, true, 99, 2);
    assert_eq!(numbered_lines(&bottom), vec![3, 4, 5]);
    assert!(bottom.contains("<mark>e</mark>"));
  }

  #[test]
  fn code_is_escaped_and_trailing_blank_not_numbered() {
    let html = format_code_block("<b>\n", true, 0, 4);
    assert!(html.contains("&lt;b&gt;"));
    // split keeps the trailing empty row that lines() would drop
    let rows: Vec<&str> = html.split('\n').collect();
    assert_eq!(rows.len(), 2);
    assert!(!rows[1].contains("data-num"));
  }

  #[test]
  fn highlight_language_ignores_template_extension() {
    assert_eq!(highlight_language("data.json.jinja"), "json");
    assert_eq!(highlight_language("page.html"), "xml");
    assert_eq!(highlight_language("notes.md"), "markdown");
    assert_eq!(highlight_language("style.css.jinja"), "css");
    assert_eq!(highlight_language("page.jinja"), "xml");
  }

  #[test]
  fn minimal_page_renders_only_present_blocks() {
    let data = PageData {
      title: "Oops".to_string(),
      message: "broken".to_string(),
      ..PageData::default()
    };
    let html = minimal_page(&data);
    assert_eq!(html, "<h1>Oops</h1>\n<blockquote>broken</blockquote>\n");
  }

  #[test]
  fn limited_page_names_status_and_path() {
    let html = limited_page(404, "/missing/");
    assert!(html.contains("404 - /missing"));
    assert!(html.contains("File not found"));
  }
}
