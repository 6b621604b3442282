//! `kekvault audit` — display the audit trail.
//!
//! Usage:
//!   kekvault audit               # show last 50 entries
//!   kekvault audit --last 20     # show last 20
//!   kekvault audit --since 7d    # entries from last 7 days

use chrono::{DateTime, TimeDelta, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{load_settings, open_database, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let audit = AuditLog::new(open_database(cli, &settings)?);

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far in the past.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = |why: &str| {
        VaultError::CommandFailed(format!(
            "invalid duration '{input}' — {why} (use e.g. 7d, 24h, or 30m)"
        ))
    };

    let split = input.char_indices().last().map_or(0, |(i, _)| i);
    let (num_str, unit) = input.split_at(split);
    let num: i64 = num_str
        .parse()
        .map_err(|_| invalid("number part is not valid"))?;
    if num < 0 {
        return Err(invalid("duration cannot be negative"));
    }

    let duration = match unit {
        "d" => TimeDelta::try_days(num),
        "h" => TimeDelta::try_hours(num),
        "m" => TimeDelta::try_minutes(num),
        _ => return Err(invalid("unknown unit")),
    };

    duration
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .ok_or_else(|| invalid("duration too large"))
}

fn print_audit_table(entries: &[AuditEntry]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Action", "Secret", "Version", "Actor"]);

    for entry in entries {
        table.add_row(vec![
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_action(entry.action),
            entry.secret_name.clone(),
            entry.details.version.to_string(),
            entry.actor.clone(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

fn colorize_action(action: AuditAction) -> String {
    match action {
        AuditAction::Read => style(action.as_str()).cyan().to_string(),
        AuditAction::Write => style(action.as_str()).blue().to_string(),
    }
}
