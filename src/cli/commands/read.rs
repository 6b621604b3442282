//! `kekvault read` — decrypt and print one secret version.
//!
//! Output is the stored value followed by a single newline.

use std::io::{self, Write};

use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `read` command.
pub fn execute(cli: &Cli, name: &str, version: Option<u32>, actor: &str) -> Result<()> {
    let vault = open_vault(cli)?;

    let value = vault.read_secret(name, version, actor)?;

    // The stored bytes verbatim (secrets need not be UTF-8), then exactly
    // one newline. `write` strips one line ending from piped input, so
    // `read | write` stores the same value.
    let mut stdout = io::stdout().lock();
    stdout.write_all(&value)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;

    Ok(())
}
