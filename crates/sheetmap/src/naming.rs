//! Header text <-> field name transforms
//!
//! `firstName` becomes `"First Name"` and back. The forward transform splits
//! on character-type boundaries, so acronyms and digits form their own
//! words (`userID2x` -> `"User ID 2 X"`); the reverse transform can't tell
//! those apart from ordinary words, which makes the pair lossy for such
//! names.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharKind {
    Upper,
    Lower,
    Digit,
    Space,
    Other,
}

impl CharKind {
    fn of(c: char) -> Self {
        if c.is_uppercase() {
            CharKind::Upper
        } else if c.is_lowercase() {
            CharKind::Lower
        } else if c.is_numeric() {
            CharKind::Digit
        } else if c.is_whitespace() {
            CharKind::Space
        } else {
            CharKind::Other
        }
    }
}

/// Split a string into runs of the same character kind. An uppercase
/// letter directly followed by lowercase letters starts a new word
/// (`"HTTPServer"` -> `["HTTP", "Server"]`).
fn split_camel_case(s: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let Some(&(_, first)) = chars.first() else {
        return Vec::new();
    };

    let mut words = Vec::new();
    let mut token_start = 0usize;
    let mut current = CharKind::of(first);

    for pos in 1..chars.len() {
        let kind = CharKind::of(chars[pos].1);
        if kind == current {
            continue;
        }
        if kind == CharKind::Lower && current == CharKind::Upper {
            let new_start = pos - 1;
            if new_start != token_start {
                words.push(&s[chars[token_start].0..chars[new_start].0]);
                token_start = new_start;
            }
        } else {
            words.push(&s[chars[token_start].0..chars[pos].0]);
            token_start = pos;
        }
        current = kind;
    }
    words.push(&s[chars[token_start].0..]);
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn uncapitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `firstName` -> `"First Name"`
///
/// Blank input is returned unchanged.
pub fn camel_case_to_words(field_name: &str) -> String {
    if field_name.trim().is_empty() {
        return field_name.to_string();
    }
    split_camel_case(field_name)
        .into_iter()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"First Name"` -> `firstName`
///
/// Blank input is returned unchanged.
pub fn words_to_camel_case(header_text: &str) -> String {
    if header_text.trim().is_empty() {
        return header_text.to_string();
    }
    let joined: String = header_text.split_whitespace().map(capitalize).collect();
    uncapitalize(&joined)
}
