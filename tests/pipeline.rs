use std::fs;
use std::path::Path;

use jinjet::core::pipeline::{self, Response};
use jinjet::RequestContext;
use tempfile::{TempDir, tempdir};

fn site(files: &[(&str, &str)]) -> TempDir {
  let dir = tempdir().unwrap();
  for (name, content) in files {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
  }
  dir
}

fn get(root: &Path, uri: &str) -> Response {
  pipeline::respond(&RequestContext::for_root(root, uri))
}

fn body(response: &Response) -> String {
  String::from_utf8(response.body.clone()).unwrap()
}

#[test]
fn renders_a_template_as_html() {
  let dir = site(&[("page.jinja", "<p>{{ 20 + 22 }}</p>")]);

  let response = get(dir.path(), "/page");
  assert_eq!(response.status, 200);
  assert_eq!(response.content_type, "text/html;charset=utf-8");
  assert_eq!(body(&response), "<p>42</p>");
}

#[test]
fn template_index_wins_over_static_index() {
  let dir = site(&[
    ("index.jinja", "from the template"),
    ("index.html", "from the static file"),
  ]);

  let response = get(dir.path(), "/");
  assert_eq!(response.status, 200);
  assert_eq!(body(&response), "from the template");
}

#[test]
fn static_files_keep_their_bytes_and_type() {
  let dir = site(&[("app.css", "body { color: red }")]);

  let response = get(dir.path(), "/app.css");
  assert_eq!(response.status, 200);
  assert_eq!(response.content_type, "text/css;charset=utf-8");
  assert_eq!(body(&response), "body { color: red }");
}

#[test]
fn template_pre_extension_sets_the_content_type() {
  let dir = site(&[("data.json.jinja", "{\"n\": {{ 2 * 3 }}}")]);

  let response = get(dir.path(), "/data.json");
  assert_eq!(response.status, 200);
  assert_eq!(response.content_type, "application/json;charset=utf-8");
  assert_eq!(body(&response), "{\"n\": 6}");
}

#[test]
fn spelled_out_extension_shows_the_source() {
  let dir = site(&[("page.jinja", "<p>{{ 1 + 1 }}</p>")]);

  let response = get(dir.path(), "/page.jinja");
  assert_eq!(response.status, 200);
  let html = body(&response);
  // Escaped source with line numbers, not the rendered output
  assert!(html.contains("&lt;p&gt;"));
  assert!(html.contains("data-num=\"1\""));
  assert!(!html.contains("<p>2</p>"));
}

#[test]
fn markdown_renders_inside_the_layout() {
  let dir = site(&[("notes.md", "# Notes\n\nsome *text*")]);

  let response = get(dir.path(), "/notes");
  assert_eq!(response.status, 200);
  let html = body(&response);
  assert!(html.contains("<h1>Notes</h1>"));
  assert!(html.contains("<em>text</em>"));
}

#[test]
fn missing_file_is_a_404_page() {
  let dir = site(&[]);

  let response = get(dir.path(), "/nope");
  assert_eq!(response.status, 404);
  let html = body(&response);
  assert!(html.contains("Could not find"));
  assert!(html.contains("nope"));
}

#[test]
fn allow_list_blocks_unmatched_files() {
  let dir = site(&[
    ("jinjet.json", r#"{"allow_only": ["*.html"]}"#),
    ("secret.txt", "hidden"),
    ("ok.html", "visible"),
  ]);

  let blocked = get(dir.path(), "/secret.txt");
  assert_eq!(blocked.status, 403);
  assert!(body(&blocked).contains("Access restricted"));

  let allowed = get(dir.path(), "/ok.html");
  assert_eq!(allowed.status, 200);
  assert_eq!(body(&allowed), "visible");
}

#[test]
fn empty_directory_listing_says_so() {
  let dir = site(&[]);
  fs::create_dir(dir.path().join("empty")).unwrap();

  let response = get(dir.path(), "/empty/");
  assert_eq!(response.status, 200);
  assert!(body(&response).contains("Empty directory"));
}

#[test]
fn directory_listing_links_templates_without_extension() {
  let dir = site(&[
    ("docs/about.jinja", ""),
    ("docs/readme.txt", ""),
  ]);

  let response = get(dir.path(), "/docs/");
  assert_eq!(response.status, 200);
  let html = body(&response);
  assert!(html.contains("href=\"/docs/about\""));
  assert!(html.contains("href=\"/docs/readme.txt\""));
}

#[test]
fn internal_urls_keep_their_slashes() {
  let dir = site(&[("docs/about.jinja", "")]);

  let response = get(dir.path(), "/docs/");
  let html = body(&response);
  // Crumb and listing hrefs are built internally and must not be
  // entity-escaped by the autoescaper
  assert!(html.contains("href=\"/\""));
  assert!(html.contains("href=\"/docs/about\""));
  assert!(!html.contains("&#x2f;"));
}

#[test]
fn bad_namespace_halts_every_request() {
  let dir = site(&[
    ("jinjet.json", r#"{"namespaces": {"parts": "./missing"}}"#),
    ("page.jinja", "never rendered"),
  ]);

  let response = get(dir.path(), "/page");
  assert_eq!(response.status, 500);
  let html = body(&response);
  assert!(html.contains("Bad template namespace"));
  assert!(!html.contains("never rendered"));
}

#[test]
fn malformed_config_is_reported_with_the_parser_message() {
  let dir = site(&[("jinjet.json", "{ nope")]);

  let response = get(dir.path(), "/");
  assert_eq!(response.status, 500);
  assert!(body(&response).contains("JSON config"));
}

#[test]
fn template_error_page_carries_line_and_excerpt() {
  let dir = site(&[(
    "broken.jinja",
    "line one\n{{ missing_variable }}\nline three",
  )]);

  let response = get(dir.path(), "/broken");
  assert_eq!(response.status, 500);
  let html = body(&response);
  assert!(html.contains("Template error"));
  assert!(html.contains("Line 2 of <code>broken.jinja</code>"));
  // Excerpt highlights the faulty line
  assert!(html.contains("<mark>"));
}

#[test]
fn disabled_debug_mode_degrades_to_minimal_errors() {
  let dir = site(&[
    ("jinjet.json", r#"{"debug_mode": false}"#),
    ("notes.md", "# hi"),
  ]);

  // Markdown is downgraded to a plain text file
  let response = get(dir.path(), "/notes.md");
  assert_eq!(response.status, 200);
  assert_eq!(body(&response), "# hi");

  // And error pages lose their decoration
  let missing = get(dir.path(), "/nope");
  assert_eq!(missing.status, 404);
  let html = body(&missing);
  assert!(html.contains("404"));
  assert!(!html.contains("<nav"));
}
