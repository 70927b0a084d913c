use std::path::PathBuf;

use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use clap::Parser;

use jinjet::actix::{AppState, configure_routes};

/// Serve a directory of Jinja templates, Markdown and static files as a
/// local website.
#[derive(Parser, Debug)]
#[command(name = "jinjet", version, about)]
struct Cli {
  /// Site root, holding templates and the optional jinjet.json config
  #[arg(default_value = ".")]
  root: PathBuf,

  /// Serve this subdirectory of the root instead of the root itself
  #[arg(long)]
  public_root: Option<PathBuf>,

  /// Interface to listen on
  #[arg(long, default_value = "127.0.0.1")]
  host: String,

  /// Port to listen on
  #[arg(short, long, default_value_t = 8000)]
  port: u16,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
  let cli = Cli::parse();

  let script_root = cli
    .root
    .canonicalize()
    .with_context(|| format!("cannot open site root {}", cli.root.display()))?;
  let public_root = match &cli.public_root {
    Some(dir) => script_root
      .join(dir)
      .canonicalize()
      .with_context(|| format!("cannot open public root {}", dir.display()))?,
    None => script_root.clone(),
  };

  log::info!(
    "serving {} at http://{}:{}/",
    public_root.display(),
    cli.host,
    cli.port
  );

  let state = Data::new(AppState {
    script_root,
    public_root,
  });
  HttpServer::new(move || {
    App::new()
      .app_data(state.clone())
      .configure(configure_routes)
  })
  .workers(1)
  .bind((cli.host.as_str(), cli.port))
  .with_context(|| format!("cannot bind {}:{}", cli.host, cli.port))?
  .run()
  .await?;
  Ok(())
}
