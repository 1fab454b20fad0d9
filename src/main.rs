use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;

mod auth;
mod cmd;
mod config;
mod env_keys;
mod error;
mod git;
mod interrupt;
mod logger;
mod progress;
mod rest;
mod session;
mod slug;
mod yaml;

#[derive(Parser)]
#[command(version, about = "Resolve a problem slug and authenticate for pushing a submission")]
struct Opt {
    /// Log what push50 does
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a slug and print the tool's config
    Connect {
        slug: String,
        tool: String,
        /// Only use the locally cached copy of the problem repository
        #[arg(long)]
        offline: bool,
        /// Print a git exclude file instead of the config
        #[arg(long)]
        exclude: bool,
    },
    /// Authenticate with the git host
    Auth { org: String },
    /// Check, connect and authenticate for a submission
    Push {
        slug: String,
        tool: String,
        /// Organisation holding the personal forks (defaults to the slug's)
        #[arg(long)]
        org: Option<String>,
        #[arg(long)]
        offline: bool,
    },
    /// Forget the cached credential
    Logout,
    /// Check that git is installed and recent enough
    Check,
}

#[async_std::main]
async fn main() -> ExitCode {
    let opt = Opt::parse();
    logger::init(opt.verbose);
    let ctx = cmd::Context::new(config::Config::from_path(&config::CONFIG_PATH));
    if let Err(e) = interrupt::install(ctx.git.clone(), ctx.config.clone()) {
        tracing::warn!("Ctrl-C will not clear the credential cache: {}", e);
    }
    let res = match opt.command {
        Command::Connect {
            slug,
            tool,
            offline,
            exclude,
        } => cmd::connect::run(&ctx, &slug, &tool, offline, exclude).await,
        Command::Auth { org } => cmd::auth::run(&ctx, &org).await,
        Command::Push {
            slug,
            tool,
            org,
            offline,
        } => cmd::push::run(&ctx, &slug, &tool, org.as_deref(), offline).await,
        Command::Logout => cmd::logout::run(&ctx),
        Command::Check => git::check_dependencies(&ctx.git),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            ExitCode::FAILURE
        }
    }
}
