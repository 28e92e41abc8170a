//! Interactive console for the Postfix delivery queue
//!
//! Lists the queue, shows why each recipient of a chosen message is still
//! waiting, and lets the operator read, hold, release, requeue or delete it.

#![deny(clippy::pedantic, clippy::all, clippy::nursery)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::path::PathBuf;

use clap::Parser;
use postqctl::{Config, PostfixTools, Session, config::CONFIG_ENV, internal, logging};

/// Inspect and manage the Postfix delivery queue
#[derive(Parser, Debug)]
#[command(name = "postqctl")]
#[command(about = "Inspect and manage the Postfix delivery queue", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the queue listing tool (default: searched on PATH)
    #[arg(long)]
    postqueue: Option<PathBuf>,

    /// Path to the queue maintenance tool (default: searched on PATH)
    #[arg(long)]
    postsuper: Option<PathBuf>,

    /// Path to the message printing tool (default: searched on PATH)
    #[arg(long)]
    postcat: Option<PathBuf>,

    /// Column at which delay reasons are wrapped
    #[arg(short, long)]
    wrap_width: Option<usize>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = Config::load(self.config.as_deref(), from_env.as_deref())?;

        if self.postqueue.is_some() {
            config.tools.postqueue = self.postqueue;
        }
        if self.postsuper.is_some() {
            config.tools.postsuper = self.postsuper;
        }
        if self.postcat.is_some() {
            config.tools.postcat = self.postcat;
        }
        if let Some(width) = self.wrap_width {
            config.wrap_width = width;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Cli::parse().into_config()?;
    let tools = PostfixTools::discover(&config.tools)?;

    internal!(level = DEBUG, "Starting session with {:?}", tools);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut session = Session::new(tools, stdin.lock(), stdout.lock(), &config);

    let outcome = session.run()?;
    internal!(level = DEBUG, "Leaving after {:?}", outcome);

    Ok(())
}
