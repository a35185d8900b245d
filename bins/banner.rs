//! `banner`: list, show, add, update and remove organization-wide banner messages.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use configs::{AppConfig, Backend};
use dotenvy::dotenv;
use serde_json::Value;
use service::{
    BannerEntry, BannerManager, BannerUpdate, ChronoDateNormalizer, HttpSettingsStore,
    JsonFileSettingsStore, NewBanner, ServiceError, SettingsStore,
};
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "banner")]
#[command(about = "Manage organization-wide banner messages")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file (default: $CONFIG_PATH or banner.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Organization URL, e.g. https://dev.example.com/MyOrganization/
    #[arg(long, global = true)]
    org: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List banners
    List,

    /// Show details for a banner
    Show {
        /// Identifier of the banner
        #[arg(long)]
        id: String,
    },

    /// Add a new banner and immediately show it
    Add {
        /// Message to show in the banner
        #[arg(long)]
        message: String,

        /// Type of banner to present: info (default), warning, error
        #[arg(long = "type")]
        level: Option<String>,

        /// Identifier for the new banner; generated when omitted
        #[arg(long)]
        id: Option<String>,

        /// Date/time when the banner should no longer be presented; never expires when omitted
        #[arg(long)]
        expiration: Option<String>,
    },

    /// Update the message, level, or expiration date of a banner
    Update {
        /// Identifier of the banner to update
        #[arg(long)]
        id: String,

        /// Message to show in the banner
        #[arg(long)]
        message: Option<String>,

        /// Type of banner to present: info, warning, error
        #[arg(long = "type")]
        level: Option<String>,

        /// Date/time when the banner should no longer be presented; pass "" to unset it
        #[arg(long)]
        expiration: Option<String>,
    },

    /// Remove a banner
    Remove {
        /// Identifier of the banner to remove
        #[arg(long)]
        id: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => configs::load_from_file(path)?,
        None => configs::load_default()?,
    };
    if let Some(org) = &cli.org {
        cfg.settings.organization = org.clone();
    }
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

async fn build_manager(cfg: &AppConfig) -> anyhow::Result<BannerManager> {
    let s = &cfg.settings;
    let store: Arc<dyn SettingsStore> = match s.backend {
        Backend::Http => Arc::new(
            HttpSettingsStore::new(
                &s.organization,
                s.token.clone(),
                &s.api_version,
                Duration::from_secs(s.timeout_secs),
            )
            .context("cannot create settings client")?,
        ),
        Backend::File => JsonFileSettingsStore::new(&s.file_path)
            .await
            .with_context(|| format!("cannot open settings file {}", s.file_path))?,
    };
    let dates = ChronoDateNormalizer::with_offset_minutes(s.default_utc_offset_minutes)?;
    Ok(BannerManager::with_namespace(store, Arc::new(dates), s.namespace.clone()))
}

async fn run(command: Commands, banners: &BannerManager) -> Result<Option<Value>, ServiceError> {
    let out = match command {
        Commands::List => Some(to_value(banners.list().await?)),
        Commands::Show { id } => Some(to_value(banners.show(&id).await?)),
        Commands::Add { message, level, id, expiration } => {
            let added = banners.add(NewBanner { message, level, id, expiration }).await?;
            Some(to_value(added))
        }
        Commands::Update { id, message, level, expiration } => {
            let updated = banners.update(&id, BannerUpdate { message, level, expiration }).await?;
            Some(to_value(updated))
        }
        Commands::Remove { id } => {
            banners.remove(&id).await?;
            None
        }
    };
    Ok(out)
}

fn to_value<T: serde::Serialize>(v: T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

/// One row per banner: ID, LEVEL, EXPIRATION, MESSAGE.
fn render_table(value: &Value) -> String {
    let headers = ["ID", "LEVEL", "EXPIRATION", "MESSAGE"];
    let rows: Vec<[String; 4]> = value
        .as_object()
        .map(|m| {
            m.iter()
                .map(|(id, v)| {
                    let entry = BannerEntry::from_value(v);
                    [
                        id.clone(),
                        entry.level.unwrap_or_else(|| "info".into()),
                        entry.expiration_date.unwrap_or_else(|| "-".into()),
                        entry.message.unwrap_or_default(),
                    ]
                })
                .collect()
        })
        .unwrap_or_default();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: [&str; 4]| {
        let mut s = String::new();
        for (i, (cell, w)) in cells.iter().zip(widths).enumerate() {
            if i == 3 {
                s.push_str(cell);
            } else {
                s.push_str(&format!("{cell:<w$}  "));
            }
        }
        s.trim_end().to_string()
    };

    let mut out = vec![line(headers)];
    out.push(line(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str)));
    out.extend(rows.iter().map(|r| line(r.each_ref().map(String::as_str))));
    out.join("\n")
}

fn print_output(format: OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            println!("{text}");
        }
        OutputFormat::Table => println!("{}", render_table(value)),
    }
}

/// 2 for invalid input (validation, not found), 1 for everything else.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ServiceError>() {
        Some(e) if e.is_user_error() => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    // 提前加载 .env，使 RUST_LOG / BANNER_ORG / BANNER_PAT 生效
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            debug!(event = "config_invalid", error = %e, "failed to load configuration");
            eprintln!("ERROR: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.logging.format);
    debug!(
        event = "start",
        backend = ?cfg.settings.backend,
        namespace = %cfg.settings.namespace,
        version = env!("CARGO_PKG_VERSION"),
        "banner command starting"
    );

    // 单次请求，单线程运行时即可
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let output = cli.output;
    let result: anyhow::Result<Option<Value>> = rt.block_on(async move {
        let banners = build_manager(&cfg).await?;
        Ok(run(cli.command, &banners).await?)
    });

    match result {
        Ok(Some(value)) => {
            print_output(output, &value);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(event = "command_failed", error = %e, "banner command failed");
            eprintln!("ERROR: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}
