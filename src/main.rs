use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use chrono::NaiveDate;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use daily_readings::config::AppConfig;
use daily_readings::delivery::SmtpMailTransport;
use daily_readings::http::{self, AppState};
use daily_readings::llm::create_provider;
use daily_readings::pipeline::{DailyPipeline, PipelineDeps};
use daily_readings::readings::HttpReadingsFetcher;
use daily_readings::reflection;
use daily_readings::scheduler;
use daily_readings::store::RecipientStore;

/// What the binary was asked to do.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// HTTP surface plus the daily trigger.
    Serve,
    /// One pipeline run, then exit.
    RunOnce(Option<NaiveDate>),
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(String::as_str) {
        None | Some("serve") => Ok(Command::Serve),
        Some("run-once") => {
            let date = args
                .get(1)
                .map(|s| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
                })
                .transpose()?;
            Ok(Command::RunOnce(date))
        }
        Some(other) => bail!("unknown command '{other}' (expected 'serve' or 'run-once [YYYY-MM-DD]')"),
    }
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "daily-readings.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

fn build_pipeline(config: &AppConfig, store: Arc<RecipientStore>) -> anyhow::Result<DailyPipeline> {
    let smtp = config
        .smtp
        .as_ref()
        .context("SMTP_HOST is not set; configure SMTP_HOST and SMTP_FROM to send readings")?;
    let transport = Arc::new(SmtpMailTransport::new(smtp)?);
    let fetcher = Arc::new(HttpReadingsFetcher::new(config.source_url.as_str())?);
    let llm = config.llm.as_ref().map(create_provider).transpose()?;

    let deps = PipelineDeps {
        fetcher,
        reflection: reflection::from_llm(llm),
        recipients: store,
        transport,
    };
    Ok(DailyPipeline::new(deps, config.zone))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    let config = AppConfig::from_env()?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        timezone = %config.zone.name(),
        schedule = %config.schedule,
        reflections = if config.llm.is_some() { "generative" } else { "fallback" },
        "Daily Readings starting"
    );

    let store = Arc::new(
        RecipientStore::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );
    let pipeline = build_pipeline(&config, Arc::clone(&store))?;

    match command {
        Command::RunOnce(date) => {
            let summary = match date {
                Some(date) => pipeline.run(date).await?,
                None => pipeline.run_today().await?,
            };
            tracing::info!(
                success = summary.success_count,
                failed = summary.failure_count,
                "Run complete"
            );
        }
        Command::Serve => {
            let schedule = scheduler::parse_schedule(&config.schedule)?;
            let _trigger = scheduler::spawn_daily_trigger(Arc::new(pipeline), schedule, config.zone);

            let app = http::routes(AppState {
                store,
                zone: config.zone,
            });
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
                .await
                .with_context(|| format!("Failed to bind port {}", config.http_port))?;
            tracing::info!(port = config.http_port, "HTTP server started");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_serves() {
        assert_eq!(parse_command(&[]).unwrap(), Command::Serve);
        assert_eq!(parse_command(&args(&["serve"])).unwrap(), Command::Serve);
    }

    #[test]
    fn run_once_with_and_without_date() {
        assert_eq!(
            parse_command(&args(&["run-once"])).unwrap(),
            Command::RunOnce(None)
        );
        assert_eq!(
            parse_command(&args(&["run-once", "2026-10-15"])).unwrap(),
            Command::RunOnce(NaiveDate::from_ymd_opt(2026, 10, 15))
        );
    }

    #[test]
    fn bad_input_is_rejected() {
        assert!(parse_command(&args(&["run-once", "15/10/2026"])).is_err());
        assert!(parse_command(&args(&["dance"])).is_err());
    }
}
