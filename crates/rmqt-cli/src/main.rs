use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

const SETTINGS_PRECEDENCE: &str = "\
Connection settings: defaults < --profile files < RABBITMQTOOL_* env vars < flags.
Flags override environment variables; RabbitmqTool gave the environment priority.";

#[derive(Parser)]
#[command(name = "rmqt")]
#[command(about = "RabbitMQ topology snapshot, restore and diff tool", long_about = None)]
#[command(after_help = SETTINGS_PRECEDENCE)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Commands,
}

/// Connection and logging flags, accepted before or after the subcommand.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Print the resolved connection settings (password redacted) to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// YAML profile; repeat to layer (later files win)
    #[arg(long = "profile", global = true)]
    pub profiles: Vec<PathBuf>,

    /// Management host, e.g. http://localhost
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Management port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Virtual host
    #[arg(long, global = true)]
    pub vhost: Option<String>,

    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    #[arg(short = 'p', long, global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Topology snapshot commands
    Schema {
        #[command(subcommand)]
        cmd: SchemaCmd,
    },

    /// Checks for the exchange/queue pairing convention
    Masstransit {
        #[command(subcommand)]
        cmd: MasstransitCmd,
    },
}

#[derive(Subcommand)]
enum SchemaCmd {
    /// Run the broker aliveness test for the vhost
    IsAlive,

    /// Snapshot the vhost topology as JSON
    Fetch {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create every entity of a snapshot that is missing on the broker
    Restore {
        /// Snapshot file (stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Exit 1 when any entity failed
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Compare two snapshot files
    Diff {
        #[arg(long)]
        left: PathBuf,

        #[arg(long)]
        right: PathBuf,

        /// Exit 1 when the snapshots differ
        #[arg(long, default_value_t = false)]
        exit_code: bool,
    },
}

#[derive(Subcommand)]
enum MasstransitCmd {
    /// Report exchange/queue pairs without a binding between them
    Validate {
        /// Snapshot file (live fetch when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    // Silent if the file does not exist; deployments inject env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();
    init_tracing(cli.global.debug);

    match cli.cmd {
        Commands::Schema { cmd } => match cmd {
            SchemaCmd::IsAlive => commands::schema::is_alive(&cli.global),
            SchemaCmd::Fetch { out } => commands::schema::fetch(&cli.global, out.as_deref()),
            SchemaCmd::Restore { file, strict } => {
                commands::schema::restore(&cli.global, file.as_deref(), strict)
            }
            SchemaCmd::Diff {
                left,
                right,
                exit_code,
            } => commands::schema::diff(&left, &right, exit_code),
        },

        Commands::Masstransit { cmd } => match cmd {
            MasstransitCmd::Validate { file } => {
                commands::masstransit::validate(&cli.global, file.as_deref())
            }
        },
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
