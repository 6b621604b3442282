//! `kekvault rotate` — re-wrap every stored DEK under the primary KEK.
//!
//! Secret payloads are not re-encrypted; only the wrapped DEK, its nonce
//! and the recorded KEK id change on each row.

use comfy_table::{ContentArrangement, Table};

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::rotation::RotationReport;

/// Execute the `rotate` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let vault = open_vault(cli)?;

    output::info(&format!(
        "Re-wrapping all DEKs under KEK '{}'",
        vault.keys().primary_id()
    ));

    let report = vault.rotate_all()?;
    print_report(&report);

    if report.skipped.is_empty() {
        Ok(())
    } else {
        Err(VaultError::CommandFailed(format!(
            "{} row(s) could not be re-wrapped",
            report.skipped.len()
        )))
    }
}

fn print_report(report: &RotationReport) {
    output::success(&format!(
        "{} of {} row(s) re-wrapped under '{}'",
        report.rewrapped, report.scanned, report.primary_kek_id
    ));

    if report.conflicts > 0 {
        output::warning(&format!(
            "{} row(s) changed during rotation — run `kekvault rotate` again",
            report.conflicts
        ));
    }

    if !report.skipped.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Row", "Secret", "Version", "Reason"]);
        for failure in &report.skipped {
            table.add_row(vec![
                failure.secret_id.to_string(),
                failure.name.clone(),
                failure.version.to_string(),
                failure.reason.clone(),
            ]);
        }
        output::warning("Skipped rows:");
        eprintln!("{table}");
    }
}
