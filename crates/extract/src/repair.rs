use anyhow::{Context, Result};
use serde_json::Value;

use crate::schema::Extraction;

/// Salvage parser for model output. Responses are supposed to be a single
/// JSON object but often arrive wrapped in prose, truncated at the token
/// limit, or with stray closing brackets. The strategy mirrors what the
/// bulk jobs need: find the first top-level `{...}` span, normalize it,
/// strict-parse, and only fall back to bracket repair when that fails.

/// Byte span of the first top-level object: starts at the first `{`,
/// ends where bracket depth returns to zero. `None` when there is no `{`
/// or the object never closes (truncated output).
pub fn first_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;

    let mut depth: i64 = 0;
    for (i, c) in raw[start..].char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Trim a response that does not start with `{` down to the span between
/// the first `{` and the last `}`. Returns the input unchanged when there
/// is nothing to trim.
pub fn trim_to_braces(response: &str) -> &str {
    if response.starts_with('{') {
        return response;
    }
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => response,
    }
}

/// Line breaks and doubled spaces confuse nothing in a strict parser but
/// show up inside broken output where the repair pass runs; strip them
/// before any parse attempt.
fn normalize(s: &str) -> String {
    // Doubled spaces collapse first; spaces flanking a newline are left as
    // two once the newline goes.
    s.replace("\r\n", "")
        .replace("  ", " ")
        .replace('\n', "")
        .replace(", ],", " ],")
}

/// Bracket-balance repair: keep a closing bracket only when it matches the
/// innermost open one (stray closers are dropped), then close every scope
/// still open at the end of the scan, innermost first. Finally collapse
/// doubled outer braces (`{{...}}` -> `{...}`) until none remain.
pub fn repair_brackets(s: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut fixed = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '{' | '[' => {
                stack.push(c);
                fixed.push(c);
            }
            '}' => {
                if stack.last() == Some(&'{') {
                    stack.pop();
                    fixed.push(c);
                }
            }
            ']' => {
                if stack.last() == Some(&'[') {
                    stack.pop();
                    fixed.push(c);
                }
            }
            _ => fixed.push(c),
        }
    }

    while let Some(open) = stack.pop() {
        fixed.push(match open {
            '{' => '}',
            _ => ']',
        });
    }

    while fixed.starts_with("{{") && fixed.ends_with("}}") {
        fixed = fixed[1..fixed.len() - 1].to_string();
    }

    fixed
}

/// Recover the first JSON object from a raw response. Strict parse first,
/// bracket repair second; the final parse error propagates.
///
/// Multiple top-level objects in one response: only the first is returned.
pub fn parse_object(raw: &str) -> Result<Value> {
    let candidate = match first_object_span(raw) {
        Some(span) => span,
        None => {
            // No balanced span; repair the tail from the first `{`.
            let start = raw.find('{').context("no JSON object in response")?;
            &raw[start..]
        }
    };

    let normalized = normalize(candidate);
    match serde_json::from_str(&normalized) {
        Ok(value) => Ok(value),
        Err(_) => {
            let repaired = repair_brackets(&normalized);
            serde_json::from_str(&repaired)
                .with_context(|| format!("JSON parse failed even after bracket repair: {}", raw))
        }
    }
}

/// Parse a raw response into the extraction schema.
pub fn parse_extraction(raw: &str) -> Result<Extraction> {
    let value = parse_object(raw)?;
    serde_json::from_value(value).context("response JSON does not match extraction schema")
}
