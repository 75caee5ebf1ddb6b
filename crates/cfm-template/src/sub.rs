//! `Fn::Sub` template-string parsing.
//!
//! Splits a substitution template into literal runs and `${Name}` or
//! `${Name.Attribute}` placeholders. The `${!Literal}` escape form collapses
//! to the literal text `${Literal}` with no placeholder.

use std::sync::OnceLock;

use regex::Regex;

/// One segment of an `Fn::Sub` template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubPart {
    /// Literal text between placeholders.
    Text(String),
    /// A `${...}` placeholder; the name may be dotted (`Resource.Attr`) or a
    /// pseudo parameter (`AWS::Region`).
    Placeholder(String),
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

/// Parses a substitution template into its literal and placeholder parts.
///
/// Adjacent literal runs are merged and empty literals dropped, so
/// `parse_parts("${A}")` is exactly one placeholder part.
#[must_use]
pub fn parse_parts(template: &str) -> Vec<SubPart> {
    let mut parts: Vec<SubPart> = Vec::new();
    let mut push_text = |parts: &mut Vec<SubPart>, text: &str| {
        if text.is_empty() {
            return;
        }
        if let Some(SubPart::Text(last)) = parts.last_mut() {
            last.push_str(text);
        } else {
            parts.push(SubPart::Text(text.to_string()));
        }
    };

    let mut cursor = 0;
    for found in placeholder_pattern().captures_iter(template) {
        let whole = found.get(0).map(|m| (m.start(), m.end()));
        let inner = found.get(1).map(|m| m.as_str());
        let (Some((start, end)), Some(inner)) = (whole, inner) else {
            continue;
        };
        push_text(&mut parts, &template[cursor..start]);
        if let Some(escaped) = inner.strip_prefix('!') {
            push_text(&mut parts, &format!("${{{escaped}}}"));
        } else {
            parts.push(SubPart::Placeholder(inner.to_string()));
        }
        cursor = end;
    }
    push_text(&mut parts, &template[cursor..]);
    parts
}

/// Collects the distinct placeholder names in a template, in first-seen
/// order. Escaped placeholders do not count.
#[must_use]
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    for part in parse_parts(template) {
        if let SubPart::Placeholder(name) = part {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}
