mod cli;
mod commands;
mod config;
mod engine;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub host: Option<String>,
    pub token: Option<String>,
    pub timeout: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        host: cli.host,
        token: cli.token,
        timeout: cli.timeout,
    };
    log::trace!("verbosity {}", ctx.verbose);

    match cli.command {
        Command::Plan(args) => commands::declarative::plan(&ctx, &args),
        Command::Apply(args) => commands::declarative::apply(&ctx, &args),
        Command::Validate(args) => commands::declarative::validate(&ctx, &args),
        Command::Read { object, json } => commands::object::read(&ctx, &object, json),
        Command::Reset { object, yes } => commands::object::reset(&ctx, &object, yes),
        Command::Types => commands::object::types(),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "aclsync", &mut io::stdout());
            Ok(())
        }
    }
}
