//! URL-safe series identifiers.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Turns a series title (or data file stem) into its URL slug.
///
/// Lowercases, decomposes to NFD and drops the combining marks so accented
/// Latin letters fall back to their ASCII base. Every run of other characters
/// collapses into a single `-`, and dashes are trimmed at both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.nfd().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }

        if c.is_ascii_alphanumeric() {
            push_char(&mut slug, c, &mut pending_dash);
        } else if let Some(folded) = fold_letter(c) {
            for c in folded.chars() {
                push_char(&mut slug, c, &mut pending_dash);
            }
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn push_char(slug: &mut String, c: char, pending_dash: &mut bool) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push(c);
}

/// Latin letters with no canonical decomposition.
fn fold_letter(c: char) -> Option<&'static str> {
    let folded = match c {
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' => "l",
        'ı' => "i",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}
