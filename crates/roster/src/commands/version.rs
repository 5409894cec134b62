//! `roster version` -- version, build and the built-in flag domains.

use anyhow::Result;
use roster_flags::Domain;

use crate::context::RuntimeContext;
use crate::output::output_json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set `ROSTER_BUILD` at compile time to stamp release builds.
const BUILD: &str = match option_env!("ROSTER_BUILD") {
    Some(b) => b,
    None => "dev",
};

/// Execute the `roster version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let domains: Vec<&str> = Domain::ALL.iter().map(Domain::as_str).collect();

    if ctx.json {
        output_json(&serde_json::json!({
            "version": VERSION,
            "build": BUILD,
            "platform": format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
            "flag_domains": domains,
        }));
        return Ok(());
    }

    println!("roster version {} ({})", VERSION, BUILD);
    if ctx.verbose {
        println!("flag domains: {}", domains.join(", "));
    }
    Ok(())
}
