//! linkctl command - query link, address, gateway and LLDP neighbor state.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use linkstate::vendor::HwdbFile;
use linkstate::{Paths, RouteSocket};

use crate::output::{OutputFormat, OutputOptions};

#[derive(Parser)]
#[command(name = "linkctl", version, about = "Query network link state")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Do not print table headers and footers.
    #[arg(long, global = true)]
    no_legend: bool,

    /// Show all links, including those not named on the command line.
    #[arg(short = 'a', long, global = true)]
    all: bool,

    /// Directory of LLDP neighbor stores.
    #[arg(long, value_name = "DIR", global = true)]
    lldp_dir: Option<PathBuf>,

    /// Directory of per-link runtime state files.
    #[arg(long, value_name = "DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// OUI vendor database (hwdb source format).
    #[arg(long, value_name = "FILE", global = true)]
    hwdb: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List links.
    #[command(visible_alias = "l")]
    List(commands::list::ListCmd),

    /// Show link status.
    #[command(visible_alias = "s")]
    Status(commands::status::StatusCmd),

    /// Show LLDP neighbors.
    Lldp(commands::lldp::LldpCmd),

    /// Show the IPv6 address label table.
    #[command(visible_alias = "label")]
    Labels(commands::label::LabelCmd),
}

impl Cli {
    fn paths(&self) -> Paths {
        let mut paths = Paths::default();
        if let Some(dir) = &self.lldp_dir {
            paths = paths.with_lldp_dir(dir);
        }
        if let Some(dir) = &self.state_dir {
            paths = paths.with_state_dir(dir);
        }
        if let Some(file) = &self.hwdb {
            paths = paths.with_hwdb(file);
        }
        paths
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let paths = cli.paths();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let opts = OutputOptions {
        pretty: cli.pretty,
        legend: !cli.no_legend,
        all: cli.all,
    };

    let vendors = match HwdbFile::load(&paths.hwdb) {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::debug!(path = %paths.hwdb.display(), error = %e, "vendor database unavailable");
            None
        }
    };

    let socket = RouteSocket::new()?;

    let result = match cli.command {
        Some(Command::List(cmd)) => cmd.run(&socket, &paths, format, &opts),
        Some(Command::Status(cmd)) => cmd.run(&socket, &vendors, &paths, format, &opts),
        Some(Command::Lldp(cmd)) => cmd.run(&socket, &paths, format, &opts),
        Some(Command::Labels(cmd)) => cmd.run(&socket, format, &opts),
        None => commands::list::ListCmd::default().run(&socket, &paths, format, &opts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
