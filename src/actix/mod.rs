//! Actix Web front: one catch-all handler that hands every request to the
//! core pipeline and maps its outcome onto an `HttpResponse`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::web::{self, Bytes, Data, ServiceConfig};
use actix_web::{HttpRequest, HttpResponse};

use crate::core::context::RequestContext;
use crate::core::pipeline;

/// Shared server state: where the tool was started and which directory is
/// actually served.
pub struct AppState {
  /// Directory the server was started from. Config and mount markers are
  /// searched here.
  pub script_root: PathBuf,
  /// Directory requests resolve against. Usually equal to `script_root`.
  pub public_root: PathBuf,
}

fn pairs(input: &str) -> BTreeMap<String, String> {
  url::form_urlencoded::parse(input.as_bytes())
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect()
}

fn is_form_post(req: &HttpRequest) -> bool {
  req
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Catch-all handler. Every path goes through here; routing decisions are
/// the pipeline's job, not the framework's.
pub async fn serve(req: HttpRequest, body: Bytes, state: Data<AppState>) -> HttpResponse {
  let query = pairs(req.query_string());
  let form = if is_form_post(&req) {
    pairs(std::str::from_utf8(&body).unwrap_or_default())
  } else {
    BTreeMap::new()
  };
  let cookies = req
    .cookies()
    .map(|jar| {
      jar
        .iter()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
    })
    .unwrap_or_default();

  let ctx = RequestContext::build(
    &state.public_root,
    &state.script_root,
    req.path(),
    query,
    form,
    cookies,
  );
  let response = pipeline::respond(&ctx);
  log::info!("{} {} -> {}", req.method(), req.path(), response.status);

  let status =
    StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  HttpResponse::build(status)
    .content_type(response.content_type)
    .body(response.body)
}

/// Registers the catch-all route. `AppState` must be added as app data by
/// the caller.
pub fn configure_routes(cfg: &mut ServiceConfig) {
  cfg.default_service(web::to(serve));
}
