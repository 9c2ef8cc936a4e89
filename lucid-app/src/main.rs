use anyhow::{Context, Result};
use clap::Parser;
use lucid_app::{build_from_config, router};
use lucid_common::LucidConfig;
use lucid_common::observability::{LogConfig, init_logging};
use lucid_config::LucidConfigLoader;
use lucid_runtime::{LucidHandle, LucidRuntime};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "lucid", about = "Article extraction service")]
struct Cli {
    /// YAML config file; missing is fine, env vars still apply.
    #[arg(long, env = "LUCID_CONFIG", default_value = "lucid.yaml")]
    config: PathBuf,
    /// Overrides `server.bind`.
    #[arg(long)]
    bind: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let mut cfg: LucidConfig = LucidConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        cfg.server.bind = bind;
    }

    let log_path = init_logging(LogConfig::from_settings(
        "lucid",
        &cfg.logging,
        cfg.server.debug,
    ))?;
    tracing::info!(log = %log_path.display(), "logging.ready");

    let runtime = LucidRuntime::build("lucid-worker", cfg.server.worker_threads)?;
    let result = runtime.block_on(serve(cfg, runtime.handle()));
    runtime.shutdown(Duration::from_secs(5));
    result
}

async fn serve(cfg: LucidConfig, handle: LucidHandle) -> Result<()> {
    let shutdown = handle.cancellation();
    let state = build_from_config(&cfg, shutdown.clone())?;
    let app = router(state, &cfg.server);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(addr = %listener.local_addr()?, "server.listening");

    // in-flight requests hold child tokens of `shutdown`
    let on_signal = shutdown.clone();
    handle.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("server.shutdown");
        })
        .await?;
    Ok(())
}
