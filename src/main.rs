use anyhow::Result;
use taskline::app::App;
use taskline::backend::TaskFilter;
use taskline::config::Config;
use taskline::constants::{STATUS_NEVER_SYNCED, STATUS_OFFLINE, STATUS_ONLINE, SYNC_ALREADY_RUNNING};
use taskline::logger::{init_logging, Logger};
use taskline::sync::DrainOutcome;

const USAGE: &str = "Usage: taskline [status|sync|tasks|init-config]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let command = std::env::args().nth(1).unwrap_or_else(|| "status".to_string());

    if command == "init-config" {
        return Config::generate_default_config(Config::get_default_config_path()?);
    }

    let logger = Logger::from_config(config.logging.enabled)?;
    init_logging(&config.logging, &logger)?;

    // Check if API token is set
    if std::env::var(&config.api.api_token_env).is_err() {
        eprintln!("❌ Error: {} environment variable not set", config.api.api_token_env);
        eprintln!("\n💡 Export your API token and run the command again.");
        return Ok(());
    }

    let app = App::build(config).await?;
    let online = app.check_connectivity().await?;

    match command.as_str() {
        "status" => {
            let status = app.data.status().await;
            println!("{}", if online { STATUS_ONLINE } else { STATUS_OFFLINE });
            println!("Pending actions: {}", status.pending_actions);
            match status.last_sync {
                Some(at) => println!("Last sync: {}", at.to_rfc3339()),
                None => println!("Last sync: {STATUS_NEVER_SYNCED}"),
            }
        }
        "sync" => match app.data.sync_now().await {
            DrainOutcome::Offline => println!("{STATUS_OFFLINE}: nothing synced"),
            DrainOutcome::AlreadyRunning => println!("{SYNC_ALREADY_RUNNING}"),
            DrainOutcome::Completed(report) => {
                println!(
                    "Synced {} of {} action(s), {} failed, {} skipped",
                    report.succeeded,
                    report.total(),
                    report.failed,
                    report.skipped
                );
            }
        },
        "tasks" => {
            let fetched = app.data.tasks(TaskFilter::default()).await;
            if let Some(notice) = fetched.notice() {
                println!("{notice}");
            }
            for task in fetched.data {
                println!("#{:<6} [{}] {}", task.id, task.status, task.title);
            }
        }
        _ => eprintln!("{USAGE}"),
    }

    Ok(())
}
