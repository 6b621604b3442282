//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{SecretSummary, VersionMetadata};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of secret names (Name, Latest, Versions).
pub fn print_secrets_table(secrets: &[SecretSummary]) {
    if secrets.is_empty() {
        info("No secrets stored yet.");
        tip("Run `kekvault write <NAME> --actor <ID>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Latest", "Versions"]);

    for s in secrets {
        table.add_row(vec![
            s.name.clone(),
            s.latest_version.to_string(),
            s.version_count.to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the version history of one secret (Version, KEK, Created, Updated).
pub fn print_versions_table(name: &str, versions: &[VersionMetadata]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Version", "KEK", "Created", "Updated"]);

    for v in versions {
        table.add_row(vec![
            v.version.to_string(),
            v.kek_id.clone().unwrap_or_else(|| "-".to_string()),
            v.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            v.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{}", style(format!("{name}: {} versions", versions.len())).bold());
    println!("{table}");
}
