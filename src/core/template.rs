use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use minijinja::value::Kwargs;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior, Value, context};

use crate::core::context::RequestContext;
use crate::core::latin::{self, LatinGenerator, LoremOutput};
use crate::core::listing::{self, EntryKind};
use crate::core::markdown;
use crate::core::nav::NavInfo;
use crate::core::page::{LAYOUT_CSS, LAYOUT_NAME, LAYOUT_SOURCE, PageData};
use crate::error::Result;

/// Builds the template environment for one request: merged engine options,
/// namespace-aware loader, request globals and the helper functions.
///
/// Construction is cheap but still done at most once per request, through
/// the memoizing accessor in the pipeline.
pub fn build_environment(ctx: &RequestContext, nav: &NavInfo) -> Result<Environment<'static>> {
  let config = &ctx.config;
  let mut env = Environment::new();

  env.set_debug(config.debug);
  env.set_undefined_behavior(if config.strict_variables {
    UndefinedBehavior::Strict
  } else {
    UndefinedBehavior::Lenient
  });
  if config.autoescape {
    env.set_auto_escape_callback(|_| AutoEscape::Html);
  } else {
    env.set_auto_escape_callback(|_| AutoEscape::None);
  }

  let doc_root = ctx.doc_root.clone();
  let namespaces = ctx.namespaces.clone();
  env.set_loader(move |name| load_template(&doc_root, &namespaces, name));
  env.add_template(LAYOUT_NAME, LAYOUT_SOURCE)?;

  // Request data and user globals; user values win on key clashes
  env.add_global("_get", Value::from_serialize(&ctx.query));
  env.add_global("_post", Value::from_serialize(&ctx.form));
  env.add_global("_cookie", Value::from_serialize(&ctx.cookies));
  // URL fragment built internally, never from request input
  env.add_global("_base", Value::from_safe_string(ctx.base_url.clone()));
  for (key, value) in &config.globals {
    env.add_global(key.clone(), Value::from_serialize(value));
  }

  // lorem('5 words'), lorem('[2-4 sentences]'), ...
  let generator: Arc<Mutex<Option<LatinGenerator>>> = Arc::new(Mutex::new(None));
  env.add_function("lorem", move |spec: Option<String>| -> Value {
    let spec = spec.unwrap_or_else(|| "1-7w".to_string());
    let Some(parsed) = latin::parse_spec(&spec) else {
      return Value::from("");
    };
    let mut guard = match generator.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let latin = guard.get_or_insert_with(LatinGenerator::new);
    match latin.generate(&parsed) {
      LoremOutput::Text(text) => Value::from(text),
      LoremOutput::Items(items) => Value::from_serialize(&items),
    }
  });

  // markdown(text), markdown(text, inline=true)
  env.add_function(
    "markdown",
    |text: Value, kwargs: Kwargs| -> Result<Value, minijinja::Error> {
      let inline: Option<bool> = kwargs.get("inline")?;
      kwargs.assert_all_used()?;
      let source = match text.as_str() {
        Some(s) => s.to_string(),
        None => text.to_string(),
      };
      Ok(Value::from_safe_string(markdown::render(
        &source,
        inline.unwrap_or(false),
      )))
    },
  );

  // files('*.json'), files(['*.json', '*.yaml'], 'data')
  let root = ctx.doc_root.clone();
  env.add_function("files", move |patterns: Value, start: Option<String>| -> Value {
    Value::from_serialize(named_glob(&root, patterns, start, EntryKind::File))
  });
  let root = ctx.doc_root.clone();
  env.add_function("folders", move |patterns: Value, start: Option<String>| -> Value {
    Value::from_serialize(named_glob(&root, patterns, start, EntryKind::Dir))
  });

  // Introspection for the internal layout page
  let assets = Value::from_serialize(BTreeMap::from([("css", LAYOUT_CSS)]));
  env.add_function("jinjet_layout_assets", move || assets.clone());
  let nav = Value::from_serialize(nav);
  env.add_function("jinjet_layout_navinfo", move || nav.clone());

  Ok(env)
}

/// Loads template sources from the document root, or from a validated
/// namespace directory for `@name/...` identifiers.
fn load_template(
  doc_root: &Path,
  namespaces: &BTreeMap<String, PathBuf>,
  name: &str,
) -> Result<Option<String>, minijinja::Error> {
  if name.contains("..") {
    return Ok(None);
  }
  let path = if let Some(rest) = name.strip_prefix('@') {
    let Some((namespace, rel)) = rest.split_once('/') else {
      return Ok(None);
    };
    let Some(dir) = namespaces.get(namespace) else {
      return Ok(None);
    };
    dir.join(rel)
  } else {
    doc_root.join(name.trim_start_matches('/'))
  };
  match std::fs::read_to_string(&path) {
    Ok(source) => Ok(Some(source)),
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(err) => Err(minijinja::Error::new(
      ErrorKind::InvalidOperation,
      format!("could not read {}: {err}", path.display()),
    )),
  }
}

/// Backing for the `files` and `folders` helpers. Accepts one pattern or a
/// sequence of them; the optional second argument moves the starting folder
/// below the document root.
fn named_glob(doc_root: &Path, patterns: Value, start: Option<String>, kind: EntryKind) -> Vec<String> {
  let mut list = Vec::new();
  if let Some(single) = patterns.as_str() {
    list.push(single.to_string());
  } else if let Ok(items) = patterns.try_iter() {
    for item in items {
      if let Some(s) = item.as_str() {
        list.push(s.to_string());
      }
    }
  }

  let start = start.unwrap_or_default();
  let start = start.trim_matches('/');
  if start.contains("..") {
    return Vec::new();
  }
  let root = if start.is_empty() {
    doc_root.to_path_buf()
  } else {
    doc_root.join(start)
  };
  listing::glob_names(&list, &root, kind)
}

/// Renders a user template by its root-relative identifier.
pub fn render_template(env: &Environment<'_>, name: &str) -> Result<String, minijinja::Error> {
  env.get_template(name)?.render(context! {})
}

/// Renders the internal layout page.
pub fn render_page(env: &Environment<'_>, data: &PageData) -> Result<String, minijinja::Error> {
  env.get_template(LAYOUT_NAME)?.render(Value::from_serialize(data))
}

/// A render failure reduced to what the error page needs.
#[derive(Debug, Clone)]
pub struct RenderFailure {
  pub message: String,
  pub template: Option<String>,
  pub line: Option<usize>,
}

/// Extracts message, template identifier and line from an engine error,
/// following the source chain so that a failure inside an included template
/// points at the template that actually broke.
pub fn explain(error: &minijinja::Error) -> RenderFailure {
  let mut current = error;
  while let Some(next) =
    std::error::Error::source(current).and_then(|source| source.downcast_ref::<minijinja::Error>())
  {
    current = next;
  }
  let message = match current.detail() {
    Some(detail) => format!("{}: {detail}", current.kind()),
    None => current.kind().to_string(),
  };
  RenderFailure {
    message,
    template: current.name().map(str::to_string),
    line: current.line(),
  }
}
