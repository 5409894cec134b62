//! `roster` -- participant flags and price formulas.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use roster_formula::{EvalError, PriceError};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

const VERBOSE_FILTER: &str = "roster=debug,roster_flags=debug,roster_formula=debug,roster_config=debug";

fn main() {
    let cli = Cli::parse();

    if cli.global.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(VERBOSE_FILTER)
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let result = RuntimeContext::from_global_args(&cli.global).and_then(|ctx| {
        tracing::debug!(roster_dir = ?ctx.roster_dir, "resolved context");
        match cli.command {
            Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
            Some(Commands::Flags(args)) => commands::flags::run(&ctx, &args),
            Some(Commands::Formula(args)) => commands::formula::run(&ctx, &args),
            Some(Commands::Price(args)) => commands::price::run(&ctx, &args),
            Some(Commands::Variable(args)) => commands::variable::run(&ctx, &args),
            Some(Commands::Version) => commands::version::run(&ctx),
            None => {
                use clap::CommandFactory;
                Cli::command().print_help().ok();
                println!();
                Ok(())
            }
        }
    });

    if let Err(e) = result {
        if cli.global.json {
            let mut err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            // Hosts key off the blocking variable of an impossible calculation.
            let missing = e.chain().find_map(|c| {
                c.downcast_ref::<EvalError>()
                    .and_then(EvalError::missing_variable)
                    .or_else(|| c.downcast_ref::<PriceError>().and_then(PriceError::missing_variable))
            });
            if let Some(variable) = missing {
                err_json["variable"] = serde_json::Value::from(variable);
            }
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
