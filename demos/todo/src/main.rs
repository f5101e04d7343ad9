//! Terminal front end for the todo list.
//!
//! Reads one command per line from stdin and re-renders the list after every
//! commit. Configuration comes from `TODO_*` environment variables (see
//! [`todo::config`]); logs go to stderr and honour `RUST_LOG`.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use todo::config::TodoConfig;
use todo::view::{Command, HELP, parse_command, render};
use todo::{
    HttpSync, InMemoryRepository, JsonFileRepository, NoopSync, SyncClient, TodoAction,
    TodoExecutor, TodoRepository, mount_or_recover,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo=info,mvu_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TodoConfig::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    let repository: Arc<dyn TodoRepository> = match &config.storage_path {
        Some(path) => Arc::new(JsonFileRepository::new(path)),
        None => Arc::new(InMemoryRepository::new()),
    };
    let sync: Arc<dyn SyncClient> = match &config.sync.url {
        Some(url) => Arc::new(HttpSync::new(url.clone(), config.sync.timeout())?),
        None => Arc::new(NoopSync),
    };

    let executor = TodoExecutor::new()
        .with_repository(Arc::clone(&repository))
        .with_sync(sync)
        .with_retry_policy(config.sync.retry_policy());

    let store = mount_or_recover(repository.as_ref(), executor)?;

    println!("{}", render(&store.snapshot()));
    println!("Type `help` for commands.");

    let mut renders = store.subscribe();
    let renderer = tokio::spawn(async move {
        while renders.changed().await.is_ok() {
            let view = render(&renders.borrow_and_update());
            println!("{view}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(Command::Dispatch(action)) => {
                store.send(action)?;
            },
            Ok(Command::New) => {
                let update = store.send(TodoAction::AddItem {
                    text: String::new(),
                })?;
                if let Some(item) = update.state.items.last() {
                    store.send(TodoAction::StartEdit { id: item.id })?;
                }
            },
            Ok(Command::List) => println!("{}", render(&store.snapshot())),
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Err(error) => println!("{error}"),
        }
    }

    renderer.abort();

    if let Err(error) = store.shutdown(config.shutdown_timeout()).await {
        tracing::warn!(error = %error, "Exiting with effects still running");
    }

    Ok(())
}
