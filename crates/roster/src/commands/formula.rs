//! `roster formula` -- parse, evaluate and check price formulas.

use anyhow::{Result, bail};
use roster_formula::{
    CHOICE_VALUE, ChoiceId, EvalError, FormulaError, ParsedFormula, Scope, VariableSnapshot, check_catalog,
    evaluate_with, normalize_input,
};
use roster_ui::styles::{render_error_pointer, render_fail_icon, render_pass_icon, render_warn};

use crate::cli::{CatalogArg, FormulaArgs, FormulaCommands, FormulaEvalArgs, FormulaParseArgs};
use crate::commands::{parse_decimal, split_pair};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `roster formula` command.
pub fn run(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    match &args.command {
        FormulaCommands::Parse(a) => run_parse(ctx, a),
        FormulaCommands::Eval(a) => run_eval(ctx, a),
        FormulaCommands::Check(a) => run_check(ctx, a),
    }
}

/// Parses user input, pointing at the offending position on syntax errors.
fn parse_input(ctx: &RuntimeContext, expression: &str) -> Result<ParsedFormula> {
    match ParsedFormula::from_input(expression) {
        Ok(formula) => Ok(formula),
        Err(err) => {
            if !ctx.json && !ctx.quiet {
                let FormulaError::Syntax { position, .. } = &err;
                eprintln!("{}", render_error_pointer(&normalize_input(expression), *position));
            }
            Err(err.into())
        }
    }
}

fn run_parse(ctx: &RuntimeContext, args: &FormulaParseArgs) -> Result<()> {
    let formula = parse_input(ctx, &args.expression)?;
    let display = ctx.config.pricing.display_formula(formula.source());

    if ctx.json {
        output_json(&serde_json::json!({
            "expression": formula.source(),
            "display": display,
            "variables": formula.variables(),
        }));
        return Ok(());
    }

    println!("Expression: {}", display);
    if formula.variables().is_empty() {
        println!("Variables:  (none)");
    } else {
        let names: Vec<_> = formula.variables().iter().map(String::as_str).collect();
        println!("Variables:  {}", names.join(", "));
    }
    Ok(())
}

fn run_eval(ctx: &RuntimeContext, args: &FormulaEvalArgs) -> Result<()> {
    let formula = parse_input(ctx, &args.expression)?;
    let options = ctx.eval_options()?;

    let scope = match &args.choice {
        Some(choice) => Scope::choice(args.event.as_str(), ChoiceId::from(choice.as_str())),
        None => Scope::event(args.event.as_str()),
    };

    let mut snapshot = match ctx.load_optional_catalog(args.catalog.as_deref())? {
        Some(loaded) => VariableSnapshot::capture(&loaded.store, &scope),
        None => VariableSnapshot::new(),
    };
    for set in &args.sets {
        let (name, value) = split_pair(set, "NAME=VALUE")?;
        snapshot = snapshot.with_value(name, parse_decimal(value)?);
    }
    if let Some(value) = &args.value {
        snapshot = snapshot.with_context(CHOICE_VALUE, parse_decimal(value)?);
    }

    let result = evaluate_with(&formula, &snapshot, &options);
    if let Err(EvalError::CalculationImpossible(e)) = &result {
        tracing::debug!(variable = %e.variable, %scope, "calculation impossible");
    }
    let amount = result?;

    if ctx.json {
        output_json(&serde_json::json!({
            "expression": formula.source(),
            "event": scope.event,
            "choice": scope.choice,
            "result": amount,
        }));
        return Ok(());
    }

    println!("{}", ctx.config.pricing.display_amount(amount));
    Ok(())
}

fn run_check(ctx: &RuntimeContext, args: &CatalogArg) -> Result<()> {
    let loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let problems = check_catalog(&loaded.catalog);
    let messages: Vec<String> = problems.iter().map(ToString::to_string).collect();

    if ctx.json {
        output_json(&serde_json::json!({
            "catalog": loaded.path.display().to_string(),
            "attributes": loaded.catalog.attributes.len(),
            "ok": problems.is_empty(),
            "problems": messages,
        }));
    } else if problems.is_empty() {
        if !ctx.quiet {
            println!(
                "{} {} attribute(s) consistent",
                render_pass_icon(),
                loaded.catalog.attributes.len()
            );
        }
    } else {
        for message in &messages {
            println!("{} {}", render_fail_icon(), render_warn(message));
        }
    }

    if !problems.is_empty() {
        bail!("{} consistency problem(s) in {}", problems.len(), loaded.path.display());
    }
    Ok(())
}
