use crate::cli::Cli;
use crate::commands::Commands;
use crate::console;
use crate::error::{CliError, Result};

use skgc_config::Config;
use skgc_core::{
    CommandCorrelator, Edition, HttpDownloader, ServerManager, StatusReport, SupervisorError,
};

use log::warn;
use serde_json::Value;

/// Execute one CLI command against the installation at `--root`.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let manager = ServerManager::open(&cli.root, config)?;

    match cli.command {
        Commands::Init { edition } => {
            let record = manager.init(edition.parse()?)?;
            println!(
                "Initialized {} server '{}' ({})",
                record.edition, record.alias, record.init_id
            );
        }
        Commands::Start => start(&manager).await?,
        Commands::Console => console::attach(&manager).await?,
        Commands::Stop => {
            manager.stop().await?;
            println!("Stop command sent");
        }
        Commands::Status => print_status(&manager.status_report()?),
        Commands::Send { text } => manager.input_command(&text.join(" ")).await?,
        Commands::Log { lines } => {
            let tail = lines.unwrap_or(manager.config().relay.log_tail_lines);
            for line in manager.read_log(tail).await? {
                println!("{line}");
            }
        }
        Commands::Coordinate { player } => {
            match CommandCorrelator::new(&manager)
                .query_coordinate(&player)
                .await?
            {
                Some(c) => println!("{} {} {}", c.x, c.y, c.z),
                None => println!("No position reported for {player}"),
            }
        }
        Commands::Port { port: None } => {
            for (key, port) in manager.ports()? {
                println!("{key}={port}");
            }
        }
        Commands::Port { port: Some(base) } => {
            for (key, port) in manager.set_port(base)? {
                println!("{key}={port}");
            }
        }
        Commands::Alias { alias: None } => println!("{}", manager.alias()?),
        Commands::Alias { alias: Some(alias) } => manager.set_alias(alias)?,
        Commands::Edition { edition: None } => println!("{}", manager.edition()?),
        Commands::Edition {
            edition: Some(edition),
        } => manager.set_edition(edition.parse::<Edition>()?)?,
        Commands::StartCommand { command: None } => println!("{}", manager.start_command()?),
        Commands::StartCommand {
            command: Some(command),
        } => manager.set_start_command(command)?,
        Commands::StopCommand { command: None } => println!("{}", manager.stop_command()?),
        Commands::StopCommand {
            command: Some(command),
        } => manager.set_stop_command(command)?,
        Commands::Update { url } => {
            let downloader = HttpDownloader::new(&manager.config().update)?;
            manager.update(&url, &downloader).await?;
            println!("Updated from {url}");
        }
        Commands::Misc { json: None } => {
            let misc = Value::Object(manager.misc()?);
            println!("{misc:#}");
        }
        Commands::Misc { json: Some(text) } => {
            let value: Value = serde_json::from_str(&text).map_err(|e| CliError::InvalidMisc {
                message: e.to_string(),
            })?;
            let Value::Object(misc) = value else {
                return Err(CliError::InvalidMisc {
                    message: String::from("expected a JSON object"),
                });
            };
            manager.set_misc(misc)?;
        }
    }

    Ok(())
}

/// Run the server with the console attached in the same invocation.
async fn start(manager: &ServerManager) -> Result<()> {
    let started = manager.start();
    let attached = async {
        // Give start() a tick to record the new pid.
        tokio::time::sleep(manager.config().relay.poll_interval()).await;
        match console::attach(manager).await {
            Err(SupervisorError::NotRunning { .. }) => Ok(()),
            other => other,
        }
    };
    tokio::pin!(started, attached);

    tokio::select! {
        result = &mut started => {
            // AlreadyRunning means the attach would follow another session.
            if !matches!(result, Err(SupervisorError::AlreadyRunning { .. }))
                && let Err(e) = attached.await
            {
                warn!("Console detached: {e}");
            }
            result?;
        }
        result = &mut attached => {
            // The session must outlive the console so the record is reconciled.
            if let Err(e) = result {
                warn!("Console detached, waiting for the server to exit: {e}");
            }
            started.await?;
        }
    }

    Ok(())
}

fn print_status(report: &StatusReport) {
    let record = &report.record;
    println!("alias:         {}", record.alias);
    println!("edition:       {}", record.edition);
    println!("init id:       {}", record.init_id);
    match record.pid {
        Some(pid) if record.status => println!("status:        running (pid {pid})"),
        _ => println!("status:        stopped"),
    }
    println!("start command: {}", record.start_command);
    println!("stop command:  {}", record.stop_command);
    match &report.ports {
        Some(ports) => {
            for (key, port) in ports {
                println!("{key:<15}{port}");
            }
        }
        None => println!("ports:         unknown (server.properties incomplete)"),
    }
}
