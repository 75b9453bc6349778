//! lamco-gateway-init - gateway container entrypoint
//!
//! Entry point for the bootstrap binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_gateway_init::bootstrap::{
    handoff, Bootstrap, GatewayPaths, DEFAULT_BUNDLE_ROOT, DEFAULT_SERVER_COMMAND,
    DEFAULT_SERVER_DIR,
};
use lamco_gateway_init::env::EnvSnapshot;
use lamco_gateway_init::errors::format_fatal;

/// Command-line arguments for lamco-gateway-init
#[derive(Parser, Debug)]
#[command(name = "lamco-gateway-init")]
#[command(version, about = "Container entrypoint for the Lamco remote desktop gateway", long_about = None)]
pub struct Args {
    /// Configuration home directory (defaults to ~/.guacamole)
    #[arg(long, env = "GUACAMOLE_HOME")]
    pub home: Option<PathBuf>,

    /// Plugin bundle root holding the packaged extension archives
    #[arg(long, default_value = DEFAULT_BUNDLE_ROOT)]
    pub bundle_dir: PathBuf,

    /// Application server directory entered before handoff
    #[arg(long, default_value = DEFAULT_SERVER_DIR)]
    pub server_dir: PathBuf,

    /// Resolve and print the configuration plan as JSON, write nothing
    #[arg(long)]
    pub check: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    pub log_format: String,

    /// Application server launch command (defaults to "catalina.sh run")
    #[arg(last = true)]
    pub server_command: Vec<String>,
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    info!("lamco-gateway-init v{}", env!("CARGO_PKG_VERSION"));
    info!("Build: {} ({})", env!("BUILD_DATE"), env!("GIT_HASH"));

    if let Err(error) = run(&args) {
        // Operator diagnostics go to stdout, not the log stream.
        println!("{}", format_fatal(&error));
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let env = EnvSnapshot::capture();
    let paths = GatewayPaths::resolve(args.home.clone())?;
    let bootstrap = Bootstrap::new(env, paths, args.bundle_dir.clone());

    let plan = bootstrap.prepare()?;
    info!("Selected backends: {:?}", plan.installed());

    if args.check {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    bootstrap.execute(&plan)?;

    let command: Vec<String> = if args.server_command.is_empty() {
        DEFAULT_SERVER_COMMAND.iter().map(|s| s.to_string()).collect()
    } else {
        args.server_command.clone()
    };
    match handoff(&args.server_dir, &command)? {}
}

fn init_logging(args: &Args) {
    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("lamco_gateway_init={},warn", log_level))
    });

    match args.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    }
}
