//! `roster flags` -- list, format and edit flag masks.

use std::str::FromStr;

use anyhow::Result;
use roster_flags::{Domain, FlagSet, LabelRegistry};
use roster_ui::styles::{render_flag_labels, render_muted};

use crate::cli::{FlagsArgs, FlagsCommands, FlagsEditArgs, FlagsFormatArgs, FlagsListArgs};
use crate::context::RuntimeContext;
use crate::output::{FlagRow, flag_rows, output_json, output_table};

/// Execute the `roster flags` command.
pub fn run(ctx: &RuntimeContext, args: &FlagsArgs) -> Result<()> {
    match &args.command {
        FlagsCommands::List(a) => run_list(ctx, a),
        FlagsCommands::Format(a) => run_format(ctx, a),
        FlagsCommands::Edit(a) => run_edit(ctx, a),
    }
}

fn domain_registry(ctx: &RuntimeContext, name: &str) -> Result<(Domain, LabelRegistry)> {
    let domain = Domain::from_str(name)?;
    let registry = ctx.config.registry(domain)?;
    Ok((domain, registry))
}

fn run_list(ctx: &RuntimeContext, args: &FlagsListArgs) -> Result<()> {
    let (domain, registry) = domain_registry(ctx, &args.domain)?;
    let rows = flag_rows(registry.catalog(), &registry);

    if ctx.json {
        output_json(&serde_json::json!({
            "domain": domain.as_str(),
            "flags": rows,
        }));
        return Ok(());
    }

    let cells: Vec<_> = rows.iter().map(FlagRow::cells).collect();
    output_table(&["BIT", "NAME", "LABEL", "CATEGORY", "ABSENCE"], &cells);
    Ok(())
}

fn run_format(ctx: &RuntimeContext, args: &FlagsFormatArgs) -> Result<()> {
    let (domain, registry) = domain_registry(ctx, &args.domain)?;
    let set = domain.flags(args.mask)?;
    let labels = registry.active_labels_with_category(&set);

    if ctx.json {
        let value = if args.with_category {
            serde_json::to_value(&labels)?
        } else {
            serde_json::to_value(labels.iter().map(|l| l.label.as_str()).collect::<Vec<_>>())?
        };
        output_json(&serde_json::json!({
            "domain": domain.as_str(),
            "mask": args.mask,
            "labels": value,
        }));
        return Ok(());
    }

    if labels.is_empty() {
        if !ctx.quiet {
            println!("{}", render_muted("(none)"));
        }
        return Ok(());
    }
    if args.with_category {
        for l in &labels {
            println!("{}  {}", render_flag_labels(std::slice::from_ref(l)), render_muted(l.category.as_str()));
        }
    } else {
        println!("{}", render_flag_labels(&labels));
    }
    Ok(())
}

fn run_edit(ctx: &RuntimeContext, args: &FlagsEditArgs) -> Result<()> {
    let (domain, registry) = domain_registry(ctx, &args.domain)?;
    let mut set = domain.flags(args.mask)?;
    apply_edits(&mut set, args)?;
    tracing::debug!(domain = %domain, from = args.mask, to = set.bits(), "edited flags");

    let labels = registry.active_labels(&set);
    if ctx.json {
        output_json(&serde_json::json!({
            "domain": domain.as_str(),
            "mask": set.bits(),
            "names": set.names(),
            "labels": labels,
        }));
        return Ok(());
    }

    println!("{}", set.bits());
    if !ctx.quiet {
        println!("{}", render_flag_labels(&registry.active_labels_with_category(&set)));
    }
    Ok(())
}

/// Applies `--enable`, then `--disable`, then `--toggle`.
fn apply_edits(set: &mut FlagSet, args: &FlagsEditArgs) -> Result<()> {
    let catalog = set.catalog().clone();
    for key in &args.enable {
        set.enable(catalog.resolve_bit(key)?)?;
    }
    for key in &args.disable {
        set.disable(catalog.resolve_bit(key)?)?;
    }
    for key in &args.toggle {
        set.toggle(catalog.resolve_bit(key)?)?;
    }
    Ok(())
}
