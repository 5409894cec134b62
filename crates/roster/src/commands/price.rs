//! `roster price` -- price breakdown of a participant's selections.

use anyhow::Result;
use roster_formula::{EventId, Selection, price_breakdown};
use roster_ui::styles::{render_header, render_separator};

use crate::cli::PriceArgs;
use crate::commands::split_pair;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `roster price` command.
pub fn run(ctx: &RuntimeContext, args: &PriceArgs) -> Result<()> {
    let loaded = ctx.load_catalog(args.catalog.as_deref())?;
    let options = ctx.eval_options()?;
    let selections = parse_selections(&args.selections)?;
    let event = EventId::from(args.event.as_str());

    let breakdown = price_breakdown(&loaded.catalog.attributes, &loaded.store, &event, &selections, &options)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "event": event,
            "summands": breakdown.summands,
            "total": breakdown.total,
        }));
        return Ok(());
    }

    let pricing = &ctx.config.pricing;
    if !ctx.quiet {
        println!("{}", render_header(&format!("Price for {}", event)));
    }
    let rows: Vec<Vec<String>> = breakdown
        .summands
        .iter()
        .map(|s| {
            vec![
                s.attribute.clone(),
                s.choice.to_string(),
                pricing.display_formula(&s.formula),
                pricing.display_amount(s.amount),
            ]
        })
        .collect();
    output_table(&["ATTRIBUTE", "CHOICE", "FORMULA", "AMOUNT"], &rows);
    if !ctx.quiet && !rows.is_empty() {
        println!("{}", render_separator());
    }
    println!("Total: {}", pricing.display_amount(breakdown.total));
    Ok(())
}

fn parse_selections(args: &[String]) -> Result<Vec<Selection>> {
    args.iter()
        .map(|arg| {
            let (attribute, choice) = split_pair(arg, "ATTRIBUTE=CHOICE")?;
            Ok(Selection::new(attribute, choice))
        })
        .collect()
}
