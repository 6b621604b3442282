//! `kekvault write` — store a new version of a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `write` command.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>, actor: &str) -> Result<()> {
    // Determine the secret value from one of three sources.
    let secret_value = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        strip_line_ending(&mut buf);
        buf
    } else {
        // Source 3: Interactive hidden prompt.
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter value for {name}"))
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?,
        )
    };

    let vault = open_vault(cli)?;
    let version = vault.write_secret(name, secret_value.as_bytes(), actor)?;

    output::success(&format!(
        "Stored '{name}' version {version} (wrapped under KEK '{}')",
        vault.keys().primary_id()
    ));
    output::tip(&format!("Read it back: kekvault read {name} --actor <ID>"));

    Ok(())
}

/// Drop the single line ending `echo` or a heredoc appends. Any other
/// trailing whitespace belongs to the secret.
fn strip_line_ending(value: &mut String) {
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
}
