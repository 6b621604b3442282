//! `kekvault prune-audit` — drop audit records past the retention window.

use crate::audit::AuditLog;
use crate::cli::output;
use crate::cli::{load_settings, open_database, Cli};
use crate::errors::Result;

/// Execute the `prune-audit` command.
pub fn execute(cli: &Cli, days: Option<u32>) -> Result<()> {
    let settings = load_settings()?;
    let audit = AuditLog::new(open_database(cli, &settings)?);

    let days = days.unwrap_or(settings.audit_retention_days);
    let removed = audit.prune_older_than(days)?;

    output::success(&format!(
        "Removed {removed} audit record(s) older than {days} day(s)"
    ));
    Ok(())
}
