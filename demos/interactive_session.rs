// Drive a sync session from stdin
//
// Usage: cargo run --example interactive_session -- <page-url> [store.json]
//
// Every plain line is appended to the textarea buffer and re-emitted as a text edit.
// Commands: :clear  :add  :rm <n>  :toggle <n> on|off  :all on|off  :port <value>  :show

use anyhow::{Context, Result, bail};
use headit_sync::{
    EditEvent, Editor, FileStore, KvStore, Scope, SessionBuilder, SyncClient, UiMode,
    session::host_from_url,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().context("usage: interactive_session <page-url> [store.json]")?;
    let store_path = args.next().unwrap_or_else(|| "headit-store.json".to_owned());

    let host = host_from_url(&url).with_context(|| format!("no host in '{url}'"))?;
    let storage: Arc<dyn KvStore> = Arc::new(FileStore::open(&store_path)?);
    let client = SyncClient::builder().build()?;

    let mut session = SessionBuilder::new()
        .mode(UiMode {
            scope: Scope::Scoped,
            editor: Editor::FreeText,
        })
        .host(host)
        .build(storage, client);
    session.on_edit(|event, rules| {
        tracing::info!(?event, rules = rules.len(), "applied");
    });
    session.activate();

    let mut buffer = session.render_text();
    println!("{buffer}");

    let (emitter, handle) = session.spawn();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match line.strip_prefix(':') {
            Some(command) => match parse_command(command, &mut buffer) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
            None => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                EditEvent::Text(buffer.clone())
            }
        };
        if !emitter.emit(event) {
            break;
        }
    }

    drop(emitter);
    let outcomes = handle.await?;
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}

fn parse_command(command: &str, buffer: &mut String) -> Result<Option<EditEvent>> {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let event = match parts.as_slice() {
        ["clear"] => {
            buffer.clear();
            EditEvent::Text(String::new())
        }
        ["show"] => {
            println!("{buffer}");
            return Ok(None);
        }
        ["add"] => EditEvent::AddRow,
        ["rm", index] => EditEvent::RemoveRow {
            index: index.parse()?,
        },
        ["toggle", index, state] => EditEvent::Toggle {
            index: index.parse()?,
            enabled: parse_switch(state)?,
        },
        ["all", state] => EditEvent::SetAllEnabled(parse_switch(state)?),
        ["port", value] => EditEvent::SetEndpoint((*value).to_owned()),
        _ => bail!("unknown command ':{command}'"),
    };
    Ok(Some(event))
}

fn parse_switch(state: &str) -> Result<bool> {
    match state {
        "on" => Ok(true),
        "off" => Ok(false),
        other => bail!("expected on|off, got '{other}'"),
    }
}
