//! Terminal output for user and role listings

use colored::{ColoredString, Colorize};
use memberkit::MemberSet;
use std::fmt::Display;

pub fn success(msg: impl Display) {
    println!("{} {msg}", "✓".green());
}

pub fn warn(msg: impl Display) {
    println!("{} {msg}", "⚠".yellow());
}

pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Bold title underlined to its own width
pub fn header(title: impl Display) {
    let title = title.to_string();
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

pub fn kv(key: &str, value: impl Display) {
    println!("  {}: {value}", key.dimmed());
}

/// A labelled role list; an empty set prints as "(none)"
pub fn roles(key: &str, roles: &MemberSet) {
    if roles.is_empty() {
        kv(key, "(none)".dimmed());
    } else {
        kv(key, roles);
    }
}

/// One role per line with a colored marker and optional note
pub fn role_line(marker: ColoredString, role: &str, note: &str) {
    if note.is_empty() {
        println!("  {marker} {role}");
    } else {
        println!("  {marker} {role} {}", note.dimmed());
    }
}
