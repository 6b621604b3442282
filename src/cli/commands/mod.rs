//! One module per subcommand.

pub mod audit_cmd;
pub mod completions;
pub mod history;
pub mod list;
pub mod prune_audit;
pub mod read;
pub mod rotate;
pub mod write;
