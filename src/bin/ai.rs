//! Command-line client for OpenAI-compatible chat endpoints.
//!
//! # Usage
//!
//! ```bash
//! # Add a model; the first one added becomes the default
//! ai model add gpt-4o https://api.openai.com sk-...
//!
//! # Ask the default model (the turn is recorded in the current session)
//! ai "How to implement quicksort?"
//!
//! # Ask about a file
//! ai file main.rs "Explain what this code does"
//!
//! # Ask several models at once
//! ai multi gpt-4o,deepseek "What is functional programming?"
//!
//! # Manage sessions
//! ai session list
//! ai session switch 2
//! ai new
//! ```

use arrrg::CommandLine;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use termai::cli::{AiArgs, App, parse_command};
use termai::{Error, PlainTextRenderer, Renderer};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(
    args: AiArgs,
    free: Vec<String>,
    renderer: &mut PlainTextRenderer,
) -> Result<(), Error> {
    let command = parse_command(&free)?;
    let mut app = App::open(args)?;

    // First Ctrl+C cancels the in-flight request; a second one exits.
    let cancel = CancellationToken::new();
    let handler_cancel = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        if handler_cancel.is_cancelled() {
            std::process::exit(130);
        }
        handler_cancel.cancel();
    }) {
        tracing::warn!(error = %err, "could not install Ctrl+C handler");
    }

    let mut stdout = std::io::stdout();
    app.run(command, &cancel, renderer, &mut stdout).await
}

/// Main entry point for the ai application.
#[tokio::main]
async fn main() {
    let (args, free) =
        AiArgs::from_command_line_relaxed("USAGE: ai [OPTIONS] <question> | ai <command> [ARGS]");
    init_logging(args.verbose);
    let mut renderer = PlainTextRenderer::with_color(!args.no_color);
    if let Err(err) = run(args, free, &mut renderer).await {
        if err.is_abort() {
            renderer.print_interrupted();
        }
        renderer.print_error(&err.to_string());
        std::process::exit(1);
    }
}
