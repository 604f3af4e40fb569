//! Serverless entry point: reads one gateway event as JSON on stdin, runs it
//! through the application and writes the response event to stdout.

use actix_web::web;
use anyhow::Context;
use dotenv::dotenv;
use flatfile_auth::serverless::{handle_event, ServerlessEvent};
use flatfile_auth::{init_tracing, AppState, Settings};
use std::io::Read;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Settings::new().context("invalid configuration")?;
    let state = web::Data::new(AppState::new(config)?);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read event from stdin")?;
    let event: ServerlessEvent = serde_json::from_str(&input).context("malformed event")?;

    let response = handle_event(state, event).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}
