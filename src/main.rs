use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use feedlink::auth::RouteGuard;
use feedlink::config::{Backend, Config};
use feedlink::controllers::Console;
use feedlink::storage::{FsObjectStorage, InMemoryObjectStorage, ObjectStorage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

async fn build_console(config: &Config) -> anyhow::Result<Console> {
    let storage: Arc<dyn ObjectStorage + Sync + Send> = match &config.storage_dir {
        Some(dir) => Arc::new(FsObjectStorage::new(dir)),
        None => Arc::new(InMemoryObjectStorage::new()),
    };
    let guard = RouteGuard {
        maintenance: config.maintenance,
    };

    let console = match config.backend {
        Backend::Memory => feedlink::assemble(
            feedlink::repositories::Repositories::in_memory(),
            storage,
            guard,
        ),
        Backend::Mongo => {
            feedlink::mongo(&config.mongo_uri, &config.mongo_db, storage, guard).await?
        },
    };

    Ok(console)
}

async fn run(mut console: Console, input: impl AsyncBufRead + Unpin) -> anyhow::Result<()> {
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim_start().starts_with('#') {
            continue;
        }

        if let Some(responses) = console.execute(&line).await {
            for r in responses {
                println!("{}", r);
            }
        }
    }

    Ok(())
}

async fn async_main(config: Config) -> anyhow::Result<()> {
    let console = build_console(&config).await?;
    tracing::info!("ready ({:?} backend)", config.backend);

    match &config.script {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            run(console, BufReader::new(file)).await
        },
        None => run(console, BufReader::new(tokio::io::stdin())).await,
    }
}

static WORKER_NUM: AtomicUsize = AtomicUsize::new(0);

fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedlink=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| {
            let num = WORKER_NUM.fetch_add(1, Ordering::SeqCst);
            format!("feedlink-worker-{}", num)
        })
        .build()
    {
        Ok(r) => r,
        Err(e) => return eprintln!("cannot build runtime: {}", e),
    };

    if let Err(e) = rt.block_on(async_main(config)) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
