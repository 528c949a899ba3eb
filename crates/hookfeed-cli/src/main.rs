mod commands;
mod config;
mod terminal;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use hookfeed_client::{HttpEventSource, PollController, TokioScheduler};

use commands::{Command, HELP};
use config::{CliConfig, LogFormat};
use terminal::{TerminalView, print_block};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() {
    // Config is read before the subscriber exists so its own format applies.
    let loaded = CliConfig::load();
    let format = loaded
        .as_ref()
        .map(|(cfg, _)| cfg.log_format)
        .unwrap_or_default();
    init_tracing(format);

    let config = match loaded {
        Ok((cfg, origin)) => {
            origin.log();
            cfg
        },
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        },
    };

    let source = match HttpEventSource::from_config(&config.client) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        },
    };
    tracing::info!(base_url = source.base_url(), "hookfeed starting");

    let controller = PollController::new(Arc::new(source), Arc::new(TokioScheduler::current()));
    let view = TerminalView::new(config.render);
    view.attach(&controller);

    controller.start();
    controller.tick().await;
    print_block(HELP);

    run(&controller, &view).await;

    controller.on_unload();
    controller.dispose();
    tracing::info!("hookfeed stopped");
}

/// Dispatch stdin commands until quit, end of input, or Ctrl-C.
async fn run(controller: &PollController, view: &TerminalView) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notification_clock = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                return;
            },
            _ = notification_clock.tick() => {
                view.tick_notifications(1.0);
            },
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        return;
                    },
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => return,
                    Ok(cmd) => dispatch(controller, view, cmd),
                    Err(e) => print_block(&format!("{e}\n{HELP}")),
                }
            },
        }
    }
}

/// Actions run as independent cycles so a slow request never blocks input.
fn dispatch(controller: &PollController, view: &TerminalView, cmd: Command) {
    match cmd {
        Command::Refresh => {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.refresh().await;
            });
        },
        Command::Test(kind) => {
            let controller = controller.clone();
            tokio::spawn(async move {
                let _ = controller.send_test_event(kind).await;
            });
        },
        Command::Clear => {
            let controller = controller.clone();
            tokio::spawn(async move {
                let _ = controller.clear_events().await;
            });
        },
        Command::Visibility { hidden } => {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.on_visibility_change(hidden).await;
            });
        },
        Command::Status => print_block(&view.status_report(controller)),
        Command::Help => print_block(HELP),
        Command::Quit => {},
    }
}
