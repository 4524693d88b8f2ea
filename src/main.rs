// tg-forward: replays messages between peers, direct forward with clone
// fallback, against an in-memory stub transport.
//
// This binary exists so the crate is runnable end to end in demos; it is not
// a general Telegram forwarding tool.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use tg_forward::config;
use tg_forward::errors::CliError;
use tg_forward::jobs_jsonl::{JobDefaults, JsonlJobSource};
use tg_forward::ports::{ProgressSink, RpcPool, Uploader};
use tg_forward::stub::{StubRpcPool, StubSession, StubUploader};
use tg_forward::ForwardEngine;

struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn on_add(&self, job: &tg_forward::Elem) {
        info!(from = job.from.id, msg_id = job.msg.id, "job added");
    }

    fn on_done(&self, job: &tg_forward::Elem, err: Option<&tg_forward::ForwardError>) {
        match err {
            Some(e) => info!(from = job.from.id, msg_id = job.msg.id, error = %e, "job failed"),
            None => info!(from = job.from.id, msg_id = job.msg.id, "job done"),
        }
    }

    fn on_progress(&self, job: &tg_forward::Elem, uploaded: u64, total: u64) {
        info!(from = job.from.id, msg_id = job.msg.id, uploaded, total, "upload progress");
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "tg-forward starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "forward.toml".to_owned());
    let cfg = config::load_config_from_path(Path::new(&config_path))?;
    info!(jobs_path = %cfg.jobs_path, mode = %cfg.mode, dry_run = cfg.dry_run, "config loaded");

    let defaults = JobDefaults {
        mode: cfg.mode,
        dry_run: cfg.dry_run,
        silent: cfg.silent,
    };
    let mut jobs = JsonlJobSource::from_path(Path::new(&cfg.jobs_path), &defaults)?;

    let session = Arc::new(StubSession::new());
    let pool: Arc<dyn RpcPool> = Arc::new(StubRpcPool::new(session));
    let uploader: Arc<dyn Uploader> = Arc::new(StubUploader);
    let sink: Arc<dyn ProgressSink> = Arc::new(LoggingProgressSink);

    let mut engine = ForwardEngine::new(
        pool,
        uploader,
        sink,
        cfg.part_size_kb,
        cfg.album_fetch_page_size,
    );
    let cancel = CancellationToken::new();
    engine.forward(&mut jobs, &cancel).await?;

    info!(jobs_seen = engine.dedup_len(), "forward run complete");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}
