use clap::{Parser, Subcommand, ValueEnum};

use crate::process::LogStream;

const BUILD_VERSION: &str = env!("PMCONSOLE_BUILD_VERSION");
const BUILD_LONG_VERSION: &str = env!("PMCONSOLE_BUILD_LONG_VERSION");
const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
USAGE:
  {usage}

COMMANDS:
{subcommands}

OPTIONS:
{options}
{after-help}
";
const HELP_AFTER: &str = "\
Quick Command Map
  Inspect:
    list/ls/ps, info, logs/log, ui
  Lifecycle:
    create, start, stop, restart/rs, remove/rm, rename

Environment
  PMCONSOLE_URL          supervisor page url (default http://127.0.0.1:9876/app)
  PMCONSOLE_TOKEN        api token sent in the `token` header
  PMCONSOLE_REFRESH_MS   dashboard refresh interval (default 5000)
  PMCONSOLE_DEFAULT_PATH working directory for `create` (default: current dir)

Examples
  pmconsole ps
  pmconsole create ./server.js --name api
  pmconsole rs 3
  pmconsole log 3 --type err -f
  pmconsole --url http://10.0.0.5:9876/app#3 ui
";

#[derive(Debug, Parser)]
#[command(
    name = "pmconsole",
    version = BUILD_VERSION,
    long_version = BUILD_LONG_VERSION,
    about = "Console for a remote process supervisor",
    help_template = HELP_TEMPLATE,
    after_help = HELP_AFTER
)]
pub struct Cli {
    /// Supervisor page url; the api base is derived from it.
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[arg(long, global = true)]
    pub token: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(visible_aliases = ["ls", "ps"])]
    List,
    Info {
        id: u64,
    },
    Create {
        script: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        watch: Option<String>,
    },
    Start {
        id: u64,
    },
    Stop {
        id: u64,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    #[command(visible_alias = "rs")]
    Restart {
        id: u64,
    },
    #[command(visible_aliases = ["rm", "delete"])]
    Remove {
        id: u64,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    Rename {
        id: u64,
        name: String,
    },
    #[command(visible_alias = "log")]
    Logs {
        id: u64,
        #[arg(long = "type", value_enum, default_value_t = StreamArg::Out)]
        stream: StreamArg,
        #[arg(short = 'f', long)]
        follow: bool,
    },
    Ui {
        /// Overrides PMCONSOLE_REFRESH_MS.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum, PartialEq, Eq)]
pub enum StreamArg {
    Out,
    Err,
}

impl From<StreamArg> for LogStream {
    fn from(value: StreamArg) -> Self {
        match value {
            StreamArg::Out => LogStream::Out,
            StreamArg::Err => LogStream::Err,
        }
    }
}
