//! answer-desk: terminal front end
//!
//! Reads one question per line from stdin and prints the answer and its
//! sources.

use answer_desk::{config, render::render, HttpSearchClient, Presentation, QueryController};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with rendered answers
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting answer-desk v{}", answer_desk::VERSION);

    let settings = config::load()?;
    let client = HttpSearchClient::with_settings(&settings.service)?;
    info!("Answer service endpoint: {}", client.endpoint());

    let controller = QueryController::new(Arc::new(client));

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = controller.subscribe();

    print_usage();
    prompt(&mut stdout).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_line(&controller, &line) {
                    Flow::Quit => break,
                    Flow::Ignored => prompt(&mut stdout).await?,
                    Flow::Continue => {}
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = Presentation::from(&*updates.borrow_and_update());
                let text = if view == Presentation::default() {
                    "Cleared.\n".to_string()
                } else {
                    render(&view, &settings.ui)
                };
                stdout.write_all(text.as_bytes()).await?;
                prompt(&mut stdout).await?;
            }
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Nothing changed; the state stream will not render anything
    Ignored,
    Quit,
}

/// Apply one input line. Questions typed while a request is in flight are
/// dropped by the controller's in-flight guard.
fn handle_line(controller: &QueryController, line: &str) -> Flow {
    match line.trim() {
        ":quit" | ":q" => return Flow::Quit,
        ":reset" => {
            controller.reset();
            controller.set_query_text("");
        }
        _ => {
            controller.set_query_text(line);
            // The task is detached; its outcome arrives through the watch channel.
            if controller.submit().is_none() {
                debug!("Input ignored: {:?}", line.trim());
                return Flow::Ignored;
            }
        }
    }
    Flow::Continue
}

async fn prompt(stdout: &mut tokio::io::Stdout) -> Result<()> {
    stdout.write_all(b"\n? ").await?;
    stdout.flush().await?;
    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"answer-desk v{}
Type a question and press enter.

COMMANDS:
    :reset    Clear the current answer
    :quit     Exit

ENVIRONMENT VARIABLES:
    ANSWER_DESK_SETTINGS_PATH  Path to settings.yml
    ANSWER_DESK_ENDPOINT       Answer service URL
    ANSWER_DESK_TIMEOUT        Request timeout in seconds
    ANSWER_DESK_SHOW_DATES     Show source dates (true/false)
    RUST_LOG                   Log filter, e.g. answer_desk=debug"#,
        answer_desk::VERSION
    );
}
