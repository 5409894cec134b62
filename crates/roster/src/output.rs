//! Output formatting helpers for the `roster` CLI.

use std::io::{self, Write};

use roster_flags::{Category, FlagCatalog, LabelRegistry};
use serde::Serialize;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipes (e.g. piped to `head`).
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = write!(handle, "{}", format_table(headers, rows));
}

/// Renders an aligned table; cell widths count characters, not bytes.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let line = |cells: Vec<String>, out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(w) => format!("{:<width$}", cell, width = *w),
                None => cell.clone(),
            })
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    line(headers.iter().map(|h| h.to_string()).collect(), &mut out);
    line(widths.iter().map(|w| "-".repeat(*w)).collect(), &mut out);
    for row in rows {
        line(row.clone(), &mut out);
    }
    out
}

/// One row of `roster flags list`.
#[derive(Debug, Serialize)]
pub struct FlagRow {
    pub bit: u32,
    pub name: String,
    pub label: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absence: Option<String>,
}

/// Effective label configuration of every flag of a catalog.
pub fn flag_rows(catalog: &FlagCatalog, registry: &LabelRegistry) -> Vec<FlagRow> {
    let absence = registry.absence();
    catalog
        .entries()
        .iter()
        .map(|e| FlagRow {
            bit: e.bit,
            name: e.name.clone(),
            label: registry.label(e.bit).unwrap_or(&e.label).to_string(),
            category: registry.category(e.bit),
            absence: absence.filter(|(bit, _)| *bit == e.bit).map(|(_, l)| l.to_string()),
        })
        .collect()
}

impl FlagRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.bit.to_string(),
            self.name.clone(),
            self.label.clone(),
            self.category.to_string(),
            self.absence.clone().unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_flags::Domain;

    #[test]
    fn status_listing() {
        let domain = Domain::ParticipantStatus;
        let rows: Vec<_> = flag_rows(&domain.catalog(), domain.registry())
            .iter()
            .map(FlagRow::cells)
            .collect();
        let table = format_table(&["BIT", "NAME", "LABEL", "CATEGORY", "ABSENCE"], &rows);
        insta::assert_snapshot!(table, @r"
        BIT  NAME       LABEL      CATEGORY  ABSENCE
        ---  ---------  ---------  --------  -----------
        1    confirmed  confirmed  success   unconfirmed
        2    paid       paid       info
        4    withdrawn  withdrawn  warning
        16   rejected   rejected   danger
        ");
    }

    #[test]
    fn table_skips_nothing_for_extra_cells() {
        let out = format_table(&["A"], &[vec!["x".into(), "extra".into()]]);
        assert_eq!(out, "A\n-\nx  extra\n");
    }
}
