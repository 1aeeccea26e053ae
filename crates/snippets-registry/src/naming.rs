//! Naming conventions shared by the registry and the catalog.

use std::path::Path;

/// Module name of a library file: its basename without extension.
pub fn module_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_owned)
}

/// Human friendly form of an exported symbol name.
///
/// Marker underscores around the name are dropped, `snake_case`, `kebab-case`
/// and `camelCase` boundaries become word breaks and every word is
/// capitalized: `collapse_componentsOnX` gives `Collapse Components On X`.
pub fn nice_name(raw: &str) -> String {
    let chars: Vec<char> = raw.trim_matches('_').chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (index, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.' | ' ') {
            flush(&mut current, &mut words);
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                flush(&mut current, &mut words);
            }
        }
        current.push(c);
    }
    flush(&mut current, &mut words);

    words
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
