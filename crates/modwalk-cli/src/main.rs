#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use modwalk_core::ExtensionKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modwalk")]
#[command(author, version, about = "Scan installed packages and resolve their exports", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Config file (default: modwalk.json in the working directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Modules root, overriding the config file
    #[arg(long, global = true, value_name = "PATH", env = "MODWALK_MODULES")]
    modules: Option<PathBuf>,

    /// Condition set an origin may resolve under, comma separated; repeat for
    /// more sets (replaces the config file's sets)
    #[arg(long = "origin-conditions", global = true, value_name = "LIST")]
    origin_conditions: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Scan the modules root and print the registry
    Scan {
        /// Print the extensions map instead of the registry
        #[arg(long)]
        extensions: bool,

        /// Only extensions of this kind (server or client)
        #[arg(long, value_name = "KIND")]
        kind: Option<ExtensionKind>,
    },

    /// Resolve the exports of one package
    Resolve {
        /// Package name, e.g. `react` or `@scope/pkg`
        package: String,

        /// Subpath to resolve (`.`, `./util`, or `util`); all origins when omitted
        subpath: Option<String>,

        /// Accepted conditions, in order (default: by package type)
        #[arg(long, value_delimiter = ',')]
        conditions: Vec<String>,
    },

    /// Print the browser import map and asset lists
    Importmap {
        /// Also print the editable file list
        #[arg(long)]
        editable: bool,
    },

    /// Serve the registry and package files over HTTP
    Serve {
        /// Port to listen on (default: from config, else 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    let config = commands::load_config(&cwd, cli.config.as_deref(), cli.modules)?;
    let config = commands::with_origin_conditions(config, &cli.origin_conditions);

    let span = tracing::info_span!("cmd", cwd = %cwd.display());
    let _guard = span.enter();

    match cli.command {
        Commands::Scan { extensions, kind } => commands::scan::run(&config, extensions, kind),
        Commands::Resolve {
            package,
            subpath,
            conditions,
        } => commands::resolve::run(&config, &package, subpath.as_deref(), &conditions),
        Commands::Importmap { editable } => commands::importmap::run(&config, editable),
        Commands::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            commands::serve::run(config)
        }
    }
}
