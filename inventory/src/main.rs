//! `larder`: the refrigerator inventory in a terminal.
//!
//! Reads commands from stdin and redraws the screen after every state change.
//! Logs go to stderr, filtered by `RUST_LOG` (default `larder=info`).

use anyhow::Result;
use larder_inventory::{
    AppConfig, AuthProvider, BackendKind, Command, FirebaseBackend, InMemoryFirebase,
    InventoryAction, InventoryEnvironment, InventoryReducer, InventoryState, InventoryStore,
    Unconfigured, command::HELP, render_model,
};
use larder_runtime::Store;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "larder=info,larder_inventory=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env();
    tracing::info!(app_id = %config.app_id, backend = ?config.backend, "Starting larder");

    match config.backend {
        BackendKind::Memory => {
            let backend = InMemoryFirebase::new();
            run(backend.clone(), backend, &config).await
        },
        BackendKind::Firebase => match config.firebase_options() {
            Ok(options) => {
                let backend = FirebaseBackend::new(&options, config.poll_interval);
                run(backend.clone(), backend, &config).await
            },
            Err(error) => {
                tracing::error!(%error, "Firebase configuration unusable");
                let backend = Unconfigured::new(error.to_string());
                run(backend.clone(), backend, &config).await
            },
        },
    }
}

async fn run<A, S>(auth: A, store: S, config: &AppConfig) -> Result<()>
where
    A: AuthProvider,
    S: InventoryStore,
{
    let env = InventoryEnvironment::new(auth, store, config);
    let store = Store::new(InventoryState::new(), InventoryReducer::<A, S>::new(), env);

    let renderer = {
        let store = store.clone();
        let mut revisions = store.watch_revisions();
        tokio::spawn(async move {
            loop {
                let view = store.state(render_model).await;
                print!("\x1b[2J\x1b[H{view}\n> ");
                let _ = std::io::Write::flush(&mut std::io::stdout());
                if revisions.changed().await.is_err() {
                    break;
                }
            }
        })
    };

    store.send(InventoryAction::Bootstrap).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            },
            _ => {},
        }

        let action = store
            .state(|state| command.into_action(state))
            .await;
        match action {
            Ok(Some(action)) => {
                store.send(action).await?;
            },
            Ok(None) => {},
            Err(error) => println!("{error}"),
        }
    }

    store.send(InventoryAction::Teardown).await?;
    renderer.abort();
    store.shutdown(SHUTDOWN_TIMEOUT).await?;
    tracing::info!("Goodbye");
    Ok(())
}
