use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

/// Converts Markdown to HTML.
///
/// Inline mode produces phrasing-only output by dropping the top-level
/// paragraph wrappers; block mode emits the full document.
pub fn render(text: &str, inline: bool) -> String {
  let mut options = Options::empty();
  options.insert(Options::ENABLE_TABLES);
  options.insert(Options::ENABLE_STRIKETHROUGH);
  options.insert(Options::ENABLE_FOOTNOTES);

  let parser = Parser::new_ext(text, options);
  let mut out = String::with_capacity(text.len() * 2);
  if inline {
    let events = parser.filter(|event| {
      !matches!(
        event,
        Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph)
      )
    });
    html::push_html(&mut out, events);
  } else {
    html::push_html(&mut out, parser);
  }
  out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn block_mode_wraps_paragraphs() {
    let out = render("Hello *world*", false);
    assert_eq!(out, "<p>Hello <em>world</em></p>");
  }

  #[test]
  fn inline_mode_has_no_block_wrapper() {
    let out = render("Hello *world*", true);
    assert_eq!(out, "Hello <em>world</em>");
  }

  #[test]
  fn renders_headings_and_lists() {
    let out = render("# Title\n\n- one\n- two", false);
    assert!(out.contains("<h1>Title</h1>"));
    assert!(out.contains("<li>one</li>"));
  }
}
