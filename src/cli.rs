use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use time::UtcOffset;
use tracing::info;

use crate::app::{App, AppOptions};
use crate::error::SyncResult;
use crate::i18n::{self, Locale, Message};
use crate::notify::LogNotifier;
use crate::settings::{default_settings_path, PluginSettings};
use crate::sync::{SyncOutcome, SyncReport};

#[derive(Parser, Debug)]
#[command(
    name = "periodic-para",
    about = "Sync daily records from a memo service into markdown daily notes"
)]
pub struct Cli {
    /// Vault root directory.
    #[arg(long, global = true, default_value = ".")]
    pub vault: PathBuf,
    /// Settings file (default: <vault>/.obsidian/plugins/periodic-para/data.json).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    /// Notice language tag, e.g. `en` or `zh-CN` (default: from LANG).
    #[arg(long, global = true)]
    pub lang: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Incremental sync: only days whose section changed are rewritten.
    Sync,
    /// Full fetch, every day with records is rewritten.
    ForceSync,
    /// Keep running: sync shortly after start and then every 30 minutes.
    Run,
    /// Inspect or change the persisted settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings as JSON (token masked).
    Show,
    /// Set one setting by its persisted key, e.g. `dailyRecordHeader`.
    Set { key: String, value: String },
}

impl Cli {
    fn options(&self, offset: UtcOffset) -> AppOptions {
        AppOptions {
            settings_path: self
                .settings
                .clone()
                .unwrap_or_else(|| default_settings_path(&self.vault)),
            vault_root: self.vault.clone(),
            offset,
            locale: self.lang.as_deref().map(Locale::from_tag).unwrap_or_else(Locale::from_env),
        }
    }
}

pub async fn execute(cli: Cli, offset: UtcOffset) -> SyncResult<()> {
    let options = cli.options(offset);
    let locale = options.locale;
    let mut app = App::load(options, Arc::new(LogNotifier))?;

    match cli.command {
        Commands::Sync => print_outcome(locale, app.orchestrator().sync().await),
        Commands::ForceSync => print_outcome(locale, app.orchestrator().force_sync().await),
        Commands::Run => {
            app.start();
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for ctrl-c: {err}");
            }
            info!("shutting down");
            app.stop();
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let shown = masked(app.settings());
                println!("{}", serde_json::to_string_pretty(&shown)?);
            }
            ConfigAction::Set { key, value } => {
                // Start from the file, not the env-overridden view.
                let next = app.store().load()?.with_value(&key, &value)?;
                app.save_settings(next)?;
                println!("{key} saved to {}", app.store().path().display());
            }
        },
    }
    Ok(())
}

fn masked(settings: &PluginSettings) -> PluginSettings {
    let mut shown = settings.clone();
    if !shown.daily_record_token.is_empty() {
        shown.daily_record_token = "********".to_string();
    }
    shown
}

fn print_outcome(locale: Locale, outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Completed(report) => {
            println!("{}", i18n::text(locale, Message::SyncDone));
            print_report(&report);
        }
        SyncOutcome::Skipped => println!("sync already in progress"),
        SyncOutcome::Cancelled => println!("sync cancelled"),
        SyncOutcome::Failed(err) => {
            eprintln!("{}: {err}", i18n::text(locale, Message::SyncFailed));
        }
    }
}

fn print_report(report: &SyncReport) {
    println!("  fetched:   {}", report.fetched);
    println!("  updated:   {}", report.notes_updated);
    println!("  unchanged: {}", report.notes_unchanged);
    println!("  skipped:   {}", report.notes_skipped);
    println!("  missing:   {}", report.notes_missing);
    if report.failures > 0 {
        println!("  failures:  {}", report.failures);
    }
}
