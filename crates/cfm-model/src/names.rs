//! Identifier sanitization for the target configuration language.

use std::sync::OnceLock;

use regex::Regex;

fn camel_boundary_wordish() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap())
}

fn camel_boundary_tail() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap())
}

/// Converts CamelCase (including acronym runs) to snake_case.
///
/// `VpcId` becomes `vpc_id`, `CIDRBlock` becomes `cidr_block`.
#[must_use]
pub fn camel_to_snake(raw: &str) -> String {
    let pass1 = camel_boundary_wordish().replace_all(raw, "${1}_${2}");
    let pass2 = camel_boundary_tail().replace_all(&pass1, "${1}_${2}");
    pass2.to_lowercase()
}

/// Sanitizes an arbitrary name into a valid target-language identifier:
/// lowercase snake_case, starting with a letter.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    let snake = camel_to_snake(raw);
    let mut out = String::with_capacity(snake.len());
    let mut last_was_underscore = false;
    for ch in snake.chars() {
        let mapped = if ch.is_ascii_alphanumeric() { ch } else { '_' };
        if mapped == '_' {
            if !last_was_underscore && !out.is_empty() {
                out.push('_');
            }
            last_was_underscore = true;
        } else {
            out.push(mapped);
            last_was_underscore = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        return "resource".to_string();
    }
    if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return format!("r_{out}");
    }
    out
}

/// True when a name is already usable as a resource identifier without
/// rewriting: letters, digits, underscores or hyphens, starting with a
/// letter.
#[must_use]
pub fn is_safe_identifier(raw: &str) -> bool {
    let mut chars = raw.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Sanitizes an arbitrary name into a valid module name.
///
/// Module names are laxer than resource identifiers: hyphens survive, so
/// a stack called `prod-web-tier` keeps its shape instead of collapsing
/// to underscores.
#[must_use]
pub fn sanitize_module_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_underscore = false;
    for ch in raw.to_lowercase().chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' };
        if mapped == '_' {
            if !last_was_underscore {
                out.push('_');
            }
            last_was_underscore = true;
        } else {
            out.push(mapped);
            last_was_underscore = false;
        }
    }
    let trimmed = out.trim_matches(['_', '-']);
    if trimmed.is_empty() {
        return "unnamed_module".to_string();
    }
    if !trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return format!("module_{trimmed}");
    }
    trimmed.to_string()
}
