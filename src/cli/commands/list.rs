//! `kekvault list` — display all secret names with their latest version.

use crate::cli::output;
use crate::cli::{load_settings, open_database, Cli};
use crate::errors::Result;
use crate::vault::SecretStore;

/// Execute the `list` command.
///
/// Reads metadata only, so no master keys are needed.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings()?;
    let store = SecretStore::new(open_database(cli, &settings)?);

    let secrets = store.list_secrets()?;
    output::info(&format!("{} secret(s)", secrets.len()));
    output::print_secrets_table(&secrets);

    Ok(())
}
