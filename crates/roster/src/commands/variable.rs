//! `roster variable` -- manage formula variables and their scoped values.
//!
//! Every write loads the catalog, applies the change through the variable
//! store and writes the catalog file back.

use anyhow::{Context, Result};
use roster_formula::{
    ChoiceId, Scope, ScopeKind, Variable, VariableId, VariableSource, VariableStore, try_resolve,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::{
    KindArg, VariableArgs, VariableCommands, VariableCreateArgs, VariableDeleteArgs, VariableListArgs,
    VariableRestoreArgs, VariableScopeArgs, VariableSetArgs,
};
use crate::commands::parse_decimal;
use crate::context::{LoadedCatalog, RuntimeContext};
use crate::output::{output_json, output_table};

/// Execute the `roster variable` command.
pub fn run(ctx: &RuntimeContext, args: &VariableArgs) -> Result<()> {
    match &args.command {
        VariableCommands::List(a) => run_list(ctx, a),
        VariableCommands::Create(a) => run_create(ctx, a),
        VariableCommands::Provision(a) => run_provision(ctx, a),
        VariableCommands::Set(a) => run_set(ctx, a),
        VariableCommands::Delete(a) => run_delete(ctx, a),
        VariableCommands::Restore(a) => run_restore(ctx, a),
    }
}

fn scope_of(event: &str, choice: Option<&str>) -> Scope {
    match choice {
        Some(choice) => Scope::choice(event, ChoiceId::from(choice)),
        None => Scope::event(event),
    }
}

fn live_variable<'a>(loaded: &'a LoadedCatalog, name: &str) -> Result<&'a Variable> {
    loaded
        .store
        .variable(name)
        .with_context(|| format!("variable '{}' not found in {}", name, loaded.path.display()))
}

fn fmt_decimal(value: Option<Decimal>) -> String {
    value.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn kind_str(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::Event => "event",
        ScopeKind::Choice => "choice",
    }
}

fn report_saved(ctx: &RuntimeContext, loaded: LoadedCatalog) -> Result<()> {
    let path = loaded.save()?;
    if !ctx.json && !ctx.quiet {
        println!("Saved {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct VariableView {
    id: VariableId,
    name: String,
    kind: ScopeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Decimal>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effective: Option<Decimal>,
}

fn run_list(ctx: &RuntimeContext, args: &VariableListArgs) -> Result<()> {
    let loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let scope = args.event.as_deref().map(|e| scope_of(e, args.choice.as_deref()));

    let views: Vec<VariableView> = loaded
        .store
        .all_variables()
        .iter()
        .filter(|v| args.all || !v.is_deleted())
        .map(|v| {
            let (value, effective) = match &scope {
                Some(scope) if !v.is_deleted() => (
                    loaded
                        .store
                        .value(v.id, &scope.narrow(v.kind))
                        .and_then(|r| r.value),
                    try_resolve(v, scope, &loaded.store),
                ),
                _ => (None, None),
            };
            VariableView {
                id: v.id,
                name: v.name.clone(),
                kind: v.kind,
                default: v.default_value,
                deleted: v.is_deleted(),
                value,
                effective,
            }
        })
        .collect();

    if ctx.json {
        output_json(&views);
        return Ok(());
    }

    if views.is_empty() {
        if !ctx.quiet {
            println!("No variables.");
        }
        return Ok(());
    }

    let mut headers = vec!["ID", "NAME", "KIND", "DEFAULT"];
    if scope.is_some() {
        headers.extend(["VALUE", "EFFECTIVE"]);
    }
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|v| {
            let name = if v.deleted {
                format!("{} (deleted)", v.name)
            } else {
                v.name.clone()
            };
            let mut row = vec![v.id.to_string(), name, kind_str(v.kind).to_string(), fmt_decimal(v.default)];
            if scope.is_some() {
                row.push(fmt_decimal(v.value));
                row.push(fmt_decimal(v.effective));
            }
            row
        })
        .collect();
    output_table(&headers, &rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// create / provision / set
// ---------------------------------------------------------------------------

fn run_create(ctx: &RuntimeContext, args: &VariableCreateArgs) -> Result<()> {
    let mut loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let default = args.default.as_deref().map(parse_decimal).transpose()?;
    let kind = match args.kind {
        KindArg::Event => ScopeKind::Event,
        KindArg::Choice => ScopeKind::Choice,
    };

    let id = loaded.store.create_variable(&args.name, default, kind)?.id;
    if let Some(description) = &args.description {
        loaded.store.set_description(id, description)?;
    }
    let variable = loaded.store.variable_by_id(id).cloned();
    tracing::info!(name = %args.name, %id, "created variable");

    if ctx.json {
        output_json(&variable);
    } else if !ctx.quiet {
        println!("Created variable {} (id {})", args.name, id);
    }
    report_saved(ctx, loaded)
}

fn run_provision(ctx: &RuntimeContext, args: &VariableScopeArgs) -> Result<()> {
    let mut loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let id = live_variable(&loaded, &args.variable)?.id;
    let scope = scope_of(&args.event, args.choice.as_deref());

    let record = loaded.store.ensure_value(id, &scope)?.clone();

    if ctx.json {
        output_json(&record);
    } else if !ctx.quiet {
        println!(
            "{} for {}: {} (revision {})",
            args.variable,
            record.scope(),
            fmt_decimal(record.value),
            record.revision
        );
    }
    report_saved(ctx, loaded)
}

fn run_set(ctx: &RuntimeContext, args: &VariableSetArgs) -> Result<()> {
    let mut loaded = ctx.load_catalog(args.scope.catalog.as_deref())?;
    let id = live_variable(&loaded, &args.scope.variable)?.id;
    let scope = scope_of(&args.scope.event, args.scope.choice.as_deref());
    let value = match (&args.value, args.clear) {
        (_, true) => None,
        (Some(v), false) => Some(parse_decimal(v)?),
        (None, false) => None,
    };

    let record = loaded.store.set_value(id, &scope, value, args.revision)?.clone();

    if ctx.json {
        output_json(&record);
    } else if !ctx.quiet {
        println!(
            "{} for {} = {} (revision {})",
            args.scope.variable,
            record.scope(),
            fmt_decimal(record.value),
            record.revision
        );
    }
    report_saved(ctx, loaded)
}

// ---------------------------------------------------------------------------
// delete / restore
// ---------------------------------------------------------------------------

fn run_delete(ctx: &RuntimeContext, args: &VariableDeleteArgs) -> Result<()> {
    let mut loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let id = live_variable(&loaded, &args.variable)?.id;

    let target = match &args.event {
        Some(event) => {
            let scope = scope_of(event, args.choice.as_deref());
            loaded.store.soft_delete_value(id, &scope)?;
            format!("value of {} for {}", args.variable, scope)
        }
        None => {
            loaded.store.soft_delete_variable(id)?;
            format!("variable {} (id {})", args.variable, id)
        }
    };

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": target }));
    } else if !ctx.quiet {
        println!("Deleted {}", target);
    }
    report_saved(ctx, loaded)
}

fn run_restore(ctx: &RuntimeContext, args: &VariableRestoreArgs) -> Result<()> {
    let mut loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let id = VariableId(args.id);
    loaded.store.restore_variable(id)?;
    let variable = loaded.store.variable_by_id(id).cloned();

    if ctx.json {
        output_json(&variable);
    } else if !ctx.quiet {
        let name = variable.as_ref().map(|v| v.name.as_str()).unwrap_or("?");
        println!("Restored variable {} (id {})", name, id);
    }
    report_saved(ctx, loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_from_args() {
        assert_eq!(scope_of("E1", None), Scope::event("E1"));
        assert_eq!(scope_of("E1", Some("tent")), Scope::choice("E1", "tent"));
    }

    #[test]
    fn decimals_render_dash_when_missing() {
        assert_eq!(fmt_decimal(None), "-");
        assert_eq!(fmt_decimal(Some(Decimal::new(125, 1))), "12.5");
    }
}
