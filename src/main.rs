//! `main-core`: drive mapflow services from a terminal.
//!
//! Backend requests are answered from `MAPFLOW_FIXTURES`; workflows are kept
//! in Postgres when `DATABASE_URL` is set, in memory otherwise.

use std::error::Error;
use std::fs;

use log::{error, info};
use mapflow_adapters::{ActionOutcome, CannedTransport, UserAction};
use mapflow_core::{InMemoryWorkflowStore, WorkflowStore};
use mapflow_persistence::{build_dev_pool_from_env, PgWorkflowStore, PoolProvider};
use mapflow_rust::config::CONFIG;
use mapflow_rust::console::{help, parse_command, ConsoleCommand};
use mapflow_rust::host::{load_catalog, ConsoleHost};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let catalog = load_catalog(&CONFIG.services_path)?;
    let transport = match &CONFIG.fixtures_path {
        Some(path) => {
            let routes: Map<String, Value> = serde_json::from_str(&fs::read_to_string(path)?)?;
            info!("{} canned route(s) from {}", routes.len(), path.display());
            CannedTransport::from_routes(&routes)
        }
        None => CannedTransport::new(),
    };
    if std::env::var("DATABASE_URL").is_ok() {
        let pool = build_dev_pool_from_env()?;
        let store = PgWorkflowStore::new(PoolProvider { pool });
        let mut host = ConsoleHost::new(catalog, store, transport, CONFIG.autosave);
        register_functions(&mut host);
        repl(&mut host).await
    } else {
        let mut host = ConsoleHost::new(catalog, InMemoryWorkflowStore::new(), transport, CONFIG.autosave);
        register_functions(&mut host);
        repl(&mut host).await
    }
}

fn register_functions<S: WorkflowStore>(host: &mut ConsoleHost<CannedTransport, S>) {
    host.functions_mut()
        .register("echo", |args: &[Value]| Ok(Some(Value::Array(args.to_vec()))));
}

async fn repl<S: WorkflowStore>(host: &mut ConsoleHost<CannedTransport, S>) -> Result<(), Box<dyn Error>> {
    println!("{}", help());
    for line in host.services() {
        println!("{line}");
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        if command == ConsoleCommand::Quit {
            break;
        }
        if let Err(e) = execute(host, command).await {
            error!("{e}");
            eprintln!("error: {e}");
        }
    }
    Ok(())
}

async fn execute<S: WorkflowStore>(host: &mut ConsoleHost<CannedTransport, S>,
                                   command: ConsoleCommand)
                                   -> Result<(), Box<dyn Error>> {
    match command {
        ConsoleCommand::Services => host.services().iter().for_each(|l| println!("{l}")),
        ConsoleCommand::Start(which) => {
            let uuid = host.start(&which)?;
            println!("started {uuid}");
            show(host).await?;
        }
        ConsoleCommand::Show => show(host).await?,
        ConsoleCommand::Action(action) => act(host, action).await?,
        ConsoleCommand::Upload(path) => {
            let bytes = fs::read(&path)?;
            let name = std::path::Path::new(&path).file_name()
                                                  .map(|n| n.to_string_lossy().into_owned())
                                                  .unwrap_or(path);
            act(host, UserAction::UploadFile { name, bytes }).await?;
        }
        ConsoleCommand::Save => {
            let summary = host.persist()?;
            println!("saved {} at {}", summary.uuid, summary.saved_at.to_rfc3339());
        }
        ConsoleCommand::List => {
            for s in host.list()? {
                println!("{}  {}  {}", s.uuid, s.saved_at.to_rfc3339(), s.name);
            }
        }
        ConsoleCommand::Resume(uuid) => {
            host.resume(uuid)?;
            show(host).await?;
        }
        ConsoleCommand::Delete(uuid) => println!("deleted: {}", host.delete(uuid)?),
        ConsoleCommand::Restart => {
            host.restart()?;
            show(host).await?;
        }
        ConsoleCommand::Close => println!("closed: {}", host.close()),
        ConsoleCommand::Events => {
            for e in host.events() {
                println!("#{} {} {:?}", e.seq, e.ts.to_rfc3339(), e.kind);
            }
        }
        ConsoleCommand::Help => println!("{}", help()),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

async fn act<S: WorkflowStore>(host: &mut ConsoleHost<CannedTransport, S>, action: UserAction) -> Result<(), Box<dyn Error>> {
    match host.act(action).await? {
        ActionOutcome::FileReady { name, bytes } => {
            let name = std::path::Path::new(&name).file_name()
                                                  .map(|n| n.to_string_lossy().into_owned())
                                                  .unwrap_or_else(|| "download".into());
            fs::write(&name, &bytes)?;
            println!("wrote {} byte(s) to {name}", bytes.len());
        }
        ActionOutcome::Blocked => println!("that move is not available from this step"),
        ActionOutcome::Cleared => println!("done"),
        other => log::debug!("{other:?}"),
    }
    show(host).await
}

async fn show<S: WorkflowStore>(host: &ConsoleHost<CannedTransport, S>) -> Result<(), Box<dyn Error>> {
    let view = host.render().await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
