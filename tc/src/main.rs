use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;

use taskc::cli::{Cli, Command};
use taskc::{TaskClient, is_finished, task_id};
use taskd::protocol::NOT_FOUND;

const SCHEDULED_SUFFIX: &str = ": task scheduled";

fn setup_logging() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();
    Ok(())
}

fn print_response(response: &str) {
    let rejected = response == NOT_FOUND
        || response.contains(": failed")
        || response.starts_with("Impossible to handle")
        || response.starts_with("Server error");

    if rejected {
        println!("{}", response.red());
    } else if is_finished(response) {
        println!("{}", response.green());
    } else {
        println!("{}", response);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("taskc connecting to {}:{}", cli.host, cli.port);

    let mut client = TaskClient::connect(&cli.host, cli.port).await?;

    match cli.command {
        Command::Task {
            kind,
            data,
            packet,
            interval,
        } => {
            let response = client.submit(kind, &data).await?;
            print_response(&response);

            if packet {
                if !response.ends_with(SCHEDULED_SUFFIX) {
                    return Err(eyre!("Task was not scheduled: {}", response));
                }
                let id = task_id(&response)
                    .ok_or_else(|| eyre!("Server did not return a task identifier"))?
                    .to_string();
                println!("{}", "Waiting for updates.".dimmed());
                client
                    .poll_until_done(&id, Duration::from_secs(interval), print_response)
                    .await?;
            }
        }
        Command::Status { id } => {
            let response = client.status(&id).await?;
            print_response(&response);
        }
    }

    Ok(())
}
