mod command;
mod render;
mod shell;

use command::Command;
use crowdsolve_app::AppContext;
use shell::{Flow, Shell};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let app_context = match AppContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(app_context);
    shell.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("crowdsolve> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };

        match Command::parse(&line) {
            Ok(Some(command)) => {
                if let Flow::Quit = shell.run(command).await {
                    break;
                }
            }
            Ok(None) => {}
            // Usage errors and `--help` output alike.
            Err(err) => {
                let _ = err.print();
            }
        }
    }

    tracing::info!("Bye");
}
