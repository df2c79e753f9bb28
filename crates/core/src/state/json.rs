//! # JSON-Safe Extraction
//!
//! Pulls a JSON object out of free-form model text. Handles code fences,
//! surrounding prose, trailing commas, raw control characters inside strings,
//! smart quotes and output truncated mid-object. Purely syntactic: callers
//! decide what shape they expect and what to do with `None`.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract and deserialize the first usable JSON object in `text`
pub fn extract<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = extract_value(text)?;
    serde_json::from_value(value).ok()
}

/// Extract the first usable JSON object in `text`.
///
/// Fenced blocks tagged `json` are tried first, then every other fenced
/// block, then the raw text.
pub fn extract_value(text: &str) -> Option<Value> {
    search_regions(text).into_iter().find_map(|region| {
        region
            .body
            .match_indices('{')
            .filter_map(|(start, _)| balanced_object(&region.body[start..], region.open_ended))
            .find_map(|candidate| parse_object(&candidate))
    })
}

/// Slice of the input searched for an object
struct Region<'a> {
    body: &'a str,
    /// Runs to the end of the input, so an unclosed object may be truncation
    open_ended: bool,
}

struct FencedBlock<'a> {
    lang: &'a str,
    body: &'a str,
    closed: bool,
}

fn search_regions(text: &str) -> Vec<Region<'_>> {
    let (json_blocks, other_blocks): (Vec<_>, Vec<_>) = fenced_blocks(text)
        .into_iter()
        .partition(|block| block.lang.to_ascii_lowercase().starts_with("json"));

    json_blocks
        .into_iter()
        .chain(other_blocks)
        .map(|block| Region {
            body: block.body,
            open_ended: !block.closed,
        })
        .chain(std::iter::once(Region {
            body: text,
            open_ended: true,
        }))
        .collect()
}

/// Fenced blocks in order of appearance. Fences only open and close at the
/// start of a line, so backticks inside a JSON string do not end a block.
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut open: Option<(&str, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        match open {
            None => {
                if let Some(tag) = trimmed.strip_prefix("```") {
                    open = Some((tag.trim(), offset + line.len()));
                }
            }
            Some((lang, start)) => {
                if trimmed == "```" {
                    blocks.push(FencedBlock {
                        lang,
                        body: &text[start..offset],
                        closed: true,
                    });
                    open = None;
                }
            }
        }
        offset += line.len();
    }

    if let Some((lang, start)) = open {
        blocks.push(FencedBlock {
            lang,
            body: &text[start..],
            closed: false,
        });
    }
    blocks
}

fn parse_object(candidate: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    let repaired = repair(candidate);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&repaired) {
        return Some(value);
    }

    let requoted = repair(&normalize_quotes(candidate));
    match serde_json::from_str::<Value>(&requoted) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Scan from a leading `{` to its matching close. When `open_ended`, input
/// that stops mid-object is closed off with the missing quote and brackets.
fn balanced_object(text: &str, open_ended: bool) -> Option<String> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(text[..=i].to_string());
                }
            }
            _ => {}
        }
    }

    if stack.is_empty() || !open_ended {
        return None;
    }

    let mut closed = text.trim_end().to_string();
    if escaped {
        closed.pop();
    }
    if in_string {
        closed.push('"');
    }
    while let Some(closer) = stack.pop() {
        closed.push(closer);
    }
    Some(closed)
}

/// Drop trailing commas and escape control characters inside strings
fn repair(candidate: &str) -> String {
    let chars: Vec<char> = candidate.chars().collect();
    let mut out = String::with_capacity(candidate.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
                if !matches!(next, Some('}') | Some(']') | None) {
                    out.push(c);
                }
            }
            c => out.push(c),
        }
    }

    out
}

fn normalize_quotes(candidate: &str) -> String {
    candidate
        .chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            c => c,
        })
        .collect()
}
