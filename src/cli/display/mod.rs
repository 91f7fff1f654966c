//! Display primitives for CLI output formatting.

pub mod table;

pub use table::{list_table, render_list};

/// Render a success action result.
pub fn action_success(message: &str) -> String {
    format!("{} {}", console::style("\u{2713}").green().bold(), message)
}
