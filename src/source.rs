//! Structural checks on generated Python source.
//!
//! These never execute the code; they only look for the entry point's
//! top-level definition and its parameter list.

pub const SOURCE_EXTENSION: &str = "py";

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}

/// Byte offset just past `def name(` for a top-level definition of `name`.
fn find_definition(content: &str, name: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let header = line.strip_prefix("async ").unwrap_or(line);
        if let Some(rest) = header.strip_prefix("def ") {
            let rest = rest.trim_start();
            if let Some(after_name) = rest.strip_prefix(name) {
                if after_name.trim_start().starts_with('(') {
                    let open = line.len() - after_name.trim_start().len();
                    return Some(offset + open + 1);
                }
            }
        }
        offset += line.len();
    }
    None
}

/// True when `content` defines `name` as a top-level function.
pub fn defines_entry_point(content: &str, name: &str) -> bool {
    find_definition(content, name).is_some()
}

/// Parameter list of the top-level `name` definition with whitespace removed,
/// so formatting-only changes compare equal.
pub fn entry_point_signature(content: &str, name: &str) -> Option<String> {
    let start = find_definition(content, name)?;
    let mut depth = 1usize;
    let mut params = String::new();
    for ch in content[start..].chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(params);
                }
            }
            _ => {}
        }
        if !ch.is_whitespace() {
            params.push(ch);
        }
    }
    None
}
