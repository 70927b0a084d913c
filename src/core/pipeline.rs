use std::cell::OnceCell;
use std::fs;
use std::path::Path;

use minijinja::Environment;

use crate::core::context::RequestContext;
use crate::core::errorpage::{self, EXCERPT_WINDOW};
use crate::core::listing;
use crate::core::locate::{self, RenderMode, TEMPLATE_EXT};
use crate::core::nav::{self, NavInfo};
use crate::core::page::PageData;
use crate::core::template;
use crate::error::{JinjetError, Result};

/// The single terminal value of a pipeline run.
#[derive(Debug, Clone)]
pub struct Response {
  pub status: u16,
  pub content_type: String,
  pub body: Vec<u8>,
}

/// Per-request renderer: navigation info plus the lazily built template
/// environment, constructed at most once and never shared across requests.
pub struct Renderer<'a> {
  ctx: &'a RequestContext,
  nav: NavInfo,
  env: OnceCell<Environment<'static>>,
}

impl<'a> Renderer<'a> {
  fn new(ctx: &'a RequestContext, nav: NavInfo) -> Self {
    Self {
      ctx,
      nav,
      env: OnceCell::new(),
    }
  }

  fn env(&self) -> Result<&Environment<'static>> {
    if let Some(env) = self.env.get() {
      return Ok(env);
    }
    let built = template::build_environment(self.ctx, &self.nav)?;
    Ok(self.env.get_or_init(|| built))
  }
}

/// Runs the whole resolution and rendering pipeline for one request.
///
/// This cannot fail: every error outcome is translated into the matching
/// error response at this single point, down to the minimal fallback page.
pub fn respond(ctx: &RequestContext) -> Response {
  let target = locate::filter(
    locate::locate(&ctx.doc_root, &ctx.request_path),
    ctx.config.allow_only.as_deref(),
    ctx.config.debug_mode,
  );
  let nav = nav::build(
    &ctx.doc_root,
    &ctx.base_url,
    &ctx.request_path,
    target.real_path.as_deref(),
    ctx.config.allow_only.as_deref(),
    ctx.config.debug_mode,
  );
  let renderer = Renderer::new(ctx, nav);

  // Config problems halt before any user content renders
  if let Some(fatal) = &ctx.fatal {
    return failure_response(ctx, &renderer, fatal);
  }

  log::debug!("{} resolved as {:?}", ctx.request_path, target.mode);
  let result = match (target.mode, target.real_path.as_deref()) {
    (RenderMode::File, Some(path)) => serve_file(ctx, path),
    (RenderMode::Template, Some(path)) => serve_template(ctx, &renderer, path),
    (RenderMode::Markdown, Some(path)) => serve_markdown(ctx, &renderer, path),
    (RenderMode::Source, Some(path)) => serve_source(ctx, &renderer, path),
    (RenderMode::Dir, Some(path)) => serve_dir(ctx, &renderer, path),
    (RenderMode::Forbidden, _) => Ok(status_page(ctx, &renderer, 403)),
    _ => Ok(status_page(ctx, &renderer, 404)),
  };
  match result {
    Ok(response) => response,
    Err(err) => failure_response(ctx, &renderer, &err),
  }
}

/// Serves raw file bytes with a content type guessed from the extension.
fn serve_file(ctx: &RequestContext, path: &Path) -> Result<Response> {
  let body = fs::read(path)?;
  let content_type = content_type_for(ctx, path, "application/octet-stream");
  Ok(Response {
    status: 200,
    content_type,
    body,
  })
}

fn serve_template(ctx: &RequestContext, renderer: &Renderer<'_>, path: &Path) -> Result<Response> {
  let name = template_name(ctx, path);
  let env = renderer.env()?;
  let body = template::render_template(env, &name)?;
  // A conventional pre-extension like data.json.jinja sets the type
  let content_type = content_type_for(ctx, path, "text/html");
  Ok(Response {
    status: 200,
    content_type,
    body: body.into_bytes(),
  })
}

fn serve_markdown(ctx: &RequestContext, renderer: &Renderer<'_>, path: &Path) -> Result<Response> {
  let source = fs::read_to_string(path)?;
  let data = PageData {
    content: crate::core::markdown::render(&source, false),
    ..PageData::default()
  };
  Ok(page(ctx, renderer, 200, data))
}

fn serve_source(ctx: &RequestContext, renderer: &Renderer<'_>, path: &Path) -> Result<Response> {
  let source = fs::read_to_string(path)?;
  let lang = path
    .extension()
    .map(|e| e.to_string_lossy().to_lowercase())
    .unwrap_or_default();
  let data = PageData {
    code: errorpage::format_code_block(&source, lang != "md", 0, EXCERPT_WINDOW),
    code_lang: lang,
    nav_border: false,
    ..PageData::default()
  };
  Ok(page(ctx, renderer, 200, data))
}

fn serve_dir(ctx: &RequestContext, renderer: &Renderer<'_>, path: &Path) -> Result<Response> {
  let listing = listing::list_dir(path, &ctx.base_url, &ctx.request_path);
  let data = PageData {
    nav_border: !listing.message.is_empty(),
    message: listing.message,
    file_list: listing.files,
    dir_list: listing.dirs,
    ..PageData::default()
  };
  Ok(page(ctx, renderer, 200, data))
}

/// Titled 403/404/500 page naming the request path and the document root.
fn status_page(ctx: &RequestContext, renderer: &Renderer<'_>, status: u16) -> Response {
  let (title, verb) = match status {
    403 => ("Forbidden", "Access restricted"),
    500 => ("Error", "Could not display"),
    _ => ("File does not exist", "Could not find"),
  };
  let path = if ctx.request_path == "/" {
    ctx.request_path.clone()
  } else {
    ctx.request_path.trim_matches('/').to_string()
  };
  let message = format!(
    "{verb}: <code class=\"error\">{}</code><br>\nDocument root: <code>{}</code>",
    errorpage::escape_html(&path),
    errorpage::escape_html(&ctx.doc_root.to_string_lossy()),
  );
  page(ctx, renderer, status, PageData::titled(title, message))
}

/// Translates any failure outcome into its error response. The final line
/// of defense for the whole pipeline.
fn failure_response(ctx: &RequestContext, renderer: &Renderer<'_>, error: &JinjetError) -> Response {
  match error {
    JinjetError::BadConfig { file, message } => {
      log::error!("config error in {}: {message}", file.display());
      let data = PageData {
        meta_title: "Config Error".to_string(),
        title: "Problem while parsing your JSON config".to_string(),
        message: format!(
          "In <code class=\"error\">{}</code><br>\n{}",
          errorpage::escape_html(&file.to_string_lossy()),
          errorpage::escape_html(message),
        ),
        nav_border: true,
        ..PageData::default()
      };
      page(ctx, renderer, 500, data)
    }
    JinjetError::BadNamespace { name, path } => {
      log::error!("bad template namespace {name}: {}", path.display());
      let data = PageData {
        meta_title: "Config Error: Bad template namespace".to_string(),
        title: "Config Error: Bad template namespace".to_string(),
        message: format!(
          "<code>&quot;{}&quot;</code>: <code>&quot;{}&quot;</code> is not a directory.",
          errorpage::escape_html(name),
          errorpage::escape_html(&path.to_string_lossy()),
        ),
        nav_border: true,
        ..PageData::default()
      };
      page(ctx, renderer, 500, data)
    }
    JinjetError::Render(render_error) => template_error_page(ctx, renderer, render_error),
    JinjetError::Io(io_error) => {
      log::error!("IO error while serving {}: {io_error}", ctx.request_path);
      status_page(ctx, renderer, 500)
    }
  }
}

/// 500 page for an engine failure, with a bounded highlighted excerpt of the
/// faulty template when its file is readable.
fn template_error_page(
  ctx: &RequestContext,
  renderer: &Renderer<'_>,
  error: &minijinja::Error,
) -> Response {
  let failure = template::explain(error);
  log::warn!("template error: {}", failure.message);

  let mut data = PageData {
    title: "Template error".to_string(),
    message: errorpage::escape_html(&failure.message),
    nav_border: true,
    ..PageData::default()
  };
  if let Some(name) = &failure.template {
    let short = name.rsplit('/').next().unwrap_or(name);
    data.meta_title = format!("Error: {short}");
    if let Some(line) = failure.line {
      data.message = format!(
        "{}<br>\nLine {line} of <code>{}</code>",
        data.message,
        errorpage::escape_html(name),
      );
      // The failing template might differ from the one we started rendering
      if let Ok(source) = fs::read_to_string(template_file(ctx, name)) {
        data.code = errorpage::format_code_block(&source, true, line, EXCERPT_WINDOW);
        data.code_lang = errorpage::highlight_language(name).to_string();
      }
    }
  }
  page(ctx, renderer, 500, data)
}

/// Renders an internal page through the layout template, degrading to the
/// limited page when browsing is disabled and to the minimal plain-HTML
/// fragment when the layout itself fails. This path cannot fail.
fn page(ctx: &RequestContext, renderer: &Renderer<'_>, status: u16, data: PageData) -> Response {
  let content_type = format!("text/html;charset={}", ctx.config.charset);
  if !ctx.config.debug_mode {
    return Response {
      status,
      content_type,
      body: errorpage::limited_page(status, &ctx.request_path).into_bytes(),
    };
  }
  let rendered = renderer
    .env()
    .and_then(|env| template::render_page(env, &data).map_err(JinjetError::from));
  match rendered {
    Ok(html) => Response {
      status,
      content_type,
      body: html.into_bytes(),
    },
    Err(err) => {
      log::error!("internal layout page failed: {err}");
      let mut fallback = data;
      fallback.error = errorpage::escape_html(&err.to_string());
      Response {
        status: 500,
        content_type,
        body: errorpage::minimal_page(&fallback).into_bytes(),
      }
    }
  }
}

/// Root-relative engine identifier for a resolved template file.
fn template_name(ctx: &RequestContext, path: &Path) -> String {
  let rel = path.strip_prefix(&ctx.doc_root).unwrap_or(path);
  rel.to_string_lossy().replace('\\', "/")
}

/// Resolves an engine identifier (possibly namespaced) back to a file.
fn template_file(ctx: &RequestContext, name: &str) -> std::path::PathBuf {
  if let Some(rest) = name.strip_prefix('@') {
    if let Some((namespace, rel)) = rest.split_once('/') {
      if let Some(dir) = ctx.namespaces.get(namespace) {
        return dir.join(rel);
      }
    }
  }
  ctx.doc_root.join(name.trim_start_matches('/'))
}

/// Content type from the filename extension, looking through a trailing
/// template extension so `data.json.jinja` advertises JSON. Text-like types
/// get the configured charset appended.
fn content_type_for(ctx: &RequestContext, path: &Path, fallback: &str) -> String {
  let name = path.to_string_lossy().to_lowercase();
  let bare = name
    .strip_suffix(&format!(".{TEMPLATE_EXT}"))
    .unwrap_or(&name)
    .to_string();
  let mime = mime_guess::from_path(&bare)
    .first()
    .map(|m| m.essence_str().to_string())
    .unwrap_or_else(|| fallback.to_string());
  let text_like = ["text", "xml", "svg", "javascript", "json"];
  if text_like.iter().any(|t| mime.contains(t)) {
    format!("{mime};charset={}", ctx.config.charset)
  } else {
    mime
  }
}
