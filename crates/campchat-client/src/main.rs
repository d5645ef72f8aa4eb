mod cli;
mod repl;

use std::io::IsTerminal;

use anyhow::Result;
use campchat_client::{ChatSession, RelayClient, SendOutcome, TerminalRenderer};
use clap::Parser;
use cli::Cli;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,campchat_client=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());

    // stdout carries the conversation only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let transport = RelayClient::new(cli.relay_url, cli.token)?;
    tracing::info!(relay = %transport.url(), "Using relay");

    let session = ChatSession::new();
    session.open();

    let stdout = std::io::stdout();
    let mut renderer = if stdout.is_terminal() {
        TerminalRenderer::new(stdout)
    } else {
        TerminalRenderer::buffered(stdout)
    };
    for turn in session.turns() {
        renderer.render(&turn)?;
    }
    renderer.end_turn()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = repl::next_input(&mut lines, ctrl_c()).await? {
        if line.trim().is_empty() {
            continue;
        }
        session.set_input(line);

        let cancel = CancellationToken::new();
        let mut render_error = None;
        let outcome = {
            let reply = session.send_with_cancel(&transport, cancel.clone(), |turn| {
                if let Err(err) = renderer.render(turn) {
                    render_error.get_or_insert(err);
                }
            });
            repl::with_interrupt(reply, ctrl_c(), &cancel).await
        };
        renderer.end_turn()?;
        if let Some(err) = render_error {
            return Err(err.into());
        }

        match outcome {
            SendOutcome::Failed(kind) => tracing::debug!(kind = kind.as_str(), "Reply failed"),
            SendOutcome::Cancelled(_) => eprintln!("(interrupted)"),
            SendOutcome::Completed(_) | SendOutcome::Ignored => {}
        }
    }

    session.close();
    Ok(())
}
