//! Clap CLI definitions for the `roster` command.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

/// roster -- participant flags and price formulas.
#[derive(Parser, Debug)]
#[command(
    name = "roster",
    about = "Participant flags and price formulas for event registration",
    long_about = "Format participant status and food flags, and evaluate price formulas over \
                  event- and choice-scoped variables.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Configuration directory (default: auto-discover .roster/).
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .roster/ in the current directory.
    Init(InitArgs),

    /// Inspect, format and edit flag masks.
    Flags(FlagsArgs),

    /// Parse, evaluate and check price formulas.
    Formula(FormulaArgs),

    /// Compute the price breakdown of a participant's selections.
    Price(PriceArgs),

    /// Manage formula variables and their scoped values.
    #[command(alias = "var")]
    Variable(VariableArgs),

    /// Print version information.
    Version,
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Create an empty catalog with this name and make it the default.
    #[arg(long)]
    pub catalog: Option<String>,

    /// Overwrite an existing configuration.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// flags
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct FlagsArgs {
    #[command(subcommand)]
    pub command: FlagsCommands,
}

#[derive(Subcommand, Debug)]
pub enum FlagsCommands {
    /// List the flags of a domain with their effective labels.
    List(FlagsListArgs),

    /// Format a stored mask as labels.
    Format(FlagsFormatArgs),

    /// Enable, disable or toggle flags of a stored mask.
    Edit(FlagsEditArgs),
}

#[derive(Args, Debug)]
pub struct FlagsListArgs {
    /// Flag domain (participant_status, participant_food).
    pub domain: String,
}

#[derive(Args, Debug)]
pub struct FlagsFormatArgs {
    /// Flag domain (participant_status, participant_food).
    pub domain: String,

    /// Stored mask.
    pub mask: u32,

    /// Show the category of every label.
    #[arg(long)]
    pub with_category: bool,
}

#[derive(Args, Debug)]
pub struct FlagsEditArgs {
    /// Flag domain (participant_status, participant_food).
    pub domain: String,

    /// Stored mask to start from.
    pub mask: u32,

    /// Flags to set (name or bit value), repeatable.
    #[arg(long, value_name = "FLAG")]
    pub enable: Vec<String>,

    /// Flags to clear (name or bit value), repeatable.
    #[arg(long, value_name = "FLAG")]
    pub disable: Vec<String>,

    /// Flags to flip (name or bit value), repeatable.
    #[arg(long, value_name = "FLAG")]
    pub toggle: Vec<String>,
}

// ---------------------------------------------------------------------------
// formula
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct FormulaArgs {
    #[command(subcommand)]
    pub command: FormulaCommands,
}

#[derive(Subcommand, Debug)]
pub enum FormulaCommands {
    /// Parse an expression and list the variables it references.
    Parse(FormulaParseArgs),

    /// Evaluate an expression for an event (and choice).
    Eval(FormulaEvalArgs),

    /// Check every attribute formula of a catalog.
    Check(CatalogArg),
}

#[derive(Args, Debug)]
pub struct FormulaParseArgs {
    /// Expression, `,` or `.` as decimal separator.
    pub expression: String,
}

#[derive(Args, Debug)]
pub struct FormulaEvalArgs {
    /// Expression, `,` or `.` as decimal separator.
    pub expression: String,

    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Event to evaluate for.
    #[arg(long, default_value = "default")]
    pub event: String,

    /// Choice option to evaluate for.
    #[arg(long)]
    pub choice: Option<String>,

    /// Explicit variable value (name=value), repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub sets: Vec<String>,

    /// Value bound to the reserved `value` variable.
    #[arg(long, value_name = "NUMBER", allow_hyphen_values = true)]
    pub value: Option<String>,
}

#[derive(Args, Debug)]
pub struct CatalogArg {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,
}

// ---------------------------------------------------------------------------
// price
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Event the participant registered for.
    #[arg(long)]
    pub event: String,

    /// Selected choice (attribute=choice), repeatable.
    #[arg(long = "select", value_name = "ATTRIBUTE=CHOICE")]
    pub selections: Vec<String>,
}

// ---------------------------------------------------------------------------
// variable
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct VariableArgs {
    #[command(subcommand)]
    pub command: VariableCommands,
}

#[derive(Subcommand, Debug)]
pub enum VariableCommands {
    /// List variables, optionally resolved for an event (and choice).
    List(VariableListArgs),

    /// Create a variable.
    Create(VariableCreateArgs),

    /// Make sure a value record exists for a scope.
    Provision(VariableScopeArgs),

    /// Set or clear the value of a variable for a scope.
    Set(VariableSetArgs),

    /// Soft-delete a variable, or only its value for a scope.
    Delete(VariableDeleteArgs),

    /// Restore a soft-deleted variable.
    Restore(VariableRestoreArgs),
}

#[derive(Args, Debug)]
pub struct VariableListArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Resolve values for this event.
    #[arg(long)]
    pub event: Option<String>,

    /// Resolve values for this choice option (requires --event).
    #[arg(long, requires = "event")]
    pub choice: Option<String>,

    /// Include soft-deleted variables.
    #[arg(long)]
    pub all: bool,
}

/// Variable kind on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum KindArg {
    /// One value per event.
    #[default]
    Event,
    /// One value per event and choice option.
    Choice,
}

#[derive(Args, Debug)]
pub struct VariableCreateArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Name used inside formulas.
    #[arg(long)]
    pub name: String,

    /// Default used when a scope has no value.
    #[arg(long, allow_hyphen_values = true)]
    pub default: Option<String>,

    /// Which scope values are keyed by.
    #[arg(long, value_enum, default_value_t)]
    pub kind: KindArg,

    /// Free-text description.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct VariableScopeArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Variable name.
    #[arg(long)]
    pub variable: String,

    /// Event of the scope.
    #[arg(long)]
    pub event: String,

    /// Choice option of the scope.
    #[arg(long)]
    pub choice: Option<String>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("new_value").required(true).args(["value", "clear"])))]
pub struct VariableSetArgs {
    #[command(flatten)]
    pub scope: VariableScopeArgs,

    /// New value.
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<String>,

    /// Clear the value so the default applies.
    #[arg(long)]
    pub clear: bool,

    /// Reject the write unless the stored revision matches.
    #[arg(long)]
    pub revision: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VariableDeleteArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Variable name.
    #[arg(long)]
    pub variable: String,

    /// Only delete the value for this event.
    #[arg(long)]
    pub event: Option<String>,

    /// Only delete the value for this choice option (requires --event).
    #[arg(long, requires = "event")]
    pub choice: Option<String>,
}

#[derive(Args, Debug)]
pub struct VariableRestoreArgs {
    /// Catalog name or path (default: `catalog` from the configuration).
    #[arg(long)]
    pub catalog: Option<String>,

    /// Numeric id of the deleted variable.
    #[arg(long)]
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_selections() {
        let cli = Cli::parse_from([
            "roster", "price", "--event", "E1", "--select", "room=single", "--select", "meal=vegan",
        ]);
        match cli.command {
            Some(Commands::Price(args)) => assert_eq!(args.selections, vec!["room=single", "meal=vegan"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn set_requires_value_or_clear() {
        let res = Cli::try_parse_from(["roster", "variable", "set", "--variable", "fee", "--event", "E1"]);
        assert!(res.is_err());
    }
}
