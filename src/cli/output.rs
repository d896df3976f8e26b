//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::domain::{CodeEntry, CodeTree, Page};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print one code entry with its details
pub fn entry(entry: &CodeEntry) {
    let line = format!(
        "{:>5}  {:<20} {:<30} seq {:<4} parent {}",
        entry.id.to_string(),
        entry.code,
        entry.name,
        entry.sequence,
        entry
            .parent_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".into())
    );
    if entry.deleted {
        println!("{}", line.dimmed());
    } else {
        println!("{}", line);
    }
    if let Some(description) = &entry.description {
        detail(&description.italic());
    }
}

/// Print a code subtree
pub fn tree(tree: &CodeTree) {
    print!("{}", tree.to_termtree());
}

/// Print page position summary (dimmed)
pub fn page_footer<T>(page: &Page<T>) {
    let summary = format!(
        "page {}/{} ({} codes)",
        page.page + 1,
        page.total_pages().max(1),
        page.total_elements
    );
    println!("{}", summary.dimmed());
}
