mod app;
mod cli;
pub mod daily_note;
mod error;
mod frontmatter;
pub mod i18n;
mod io_atomic;
pub mod notify;
mod paths;
pub mod record;
pub mod render;
pub mod settings;
pub mod sync;
mod utils;
pub mod vault;

use clap::Parser;
use time::UtcOffset;

pub use app::{App, AppOptions};
pub use error::{SyncError, SyncResult};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,periodic_para_lib=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() {
    init_tracing();
    settings::load_env_files();
    let cli = cli::Cli::parse();

    // Must be read while the process is still single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
        tracing::warn!("local offset unavailable, using UTC: {err}");
        UtcOffset::UTC
    });

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(cli::execute(cli, offset)) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
