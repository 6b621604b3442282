//! `kekvault history` — list every version of one secret.

use crate::cli::output;
use crate::cli::{load_settings, open_database, Cli};
use crate::errors::Result;
use crate::vault::SecretStore;

/// Execute the `history` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let settings = load_settings()?;
    let store = SecretStore::new(open_database(cli, &settings)?);

    let versions = store.list_versions(name)?;
    output::print_versions_table(name, &versions);

    Ok(())
}
