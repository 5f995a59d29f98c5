//! Text escaping for LaTeX output.
//!
//! [`escape`] and [`unescape`] scan their input once, left to right, against a
//! fixed substitution table. Output of one substitution is never rescanned, so
//! no rule can re-trigger another. [`unescape`] reverses the character
//! escapes only, so it is an exact left inverse of [`escape`] for text without
//! escaped sequences or rewritten command names. Command rewrites are one way.

/// Character escapes applied by [`escape`] and reversed by [`unescape`].
const ESCAPES: &[(&str, &str)] = &[
    ("&", r"\&"),
    ("#", r"\#"),
    ("_", r"\_"),
    ("%", r"\%"),
];

/// Command names the book preamble does not define, and their replacements.
const COMMAND_REWRITES: &[(&str, &str)] = &[
    // gensymb's \degree is not available.
    (r"\degree", r"\textdegree"),
];

/// Known mojibake produced when UTF-8 content was decoded as Windows-1252.
const ENCODING_ARTIFACTS: &[(&str, &str)] = &[
    ("\u{e2}\u{20ac}\u{2122}", "\u{2019}"),
    ("\u{e2}\u{20ac}\u{2dc}", "\u{2018}"),
    ("\u{e2}\u{20ac}\u{153}", "\u{201c}"),
    ("\u{e2}\u{20ac}\u{9d}", "\u{201d}"),
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}"),
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"),
    ("\u{c3}\u{2014}", "\u{d7}"),
    ("\u{c2}\u{b0}", "\u{b0}"),
    ("\u{c2}\u{a0}", "\u{a0}"),
    ("\u{c2}", ""),
];

/// Escape plain text for inclusion in LaTeX.
pub fn escape(text: &str) -> String {
    substitute(text, ESCAPES.iter().chain(COMMAND_REWRITES).map(|&(from, to)| (from, to)))
}

/// Reverse [`escape`]. Used when re-entering content that is already LaTeX.
pub fn unescape(text: &str) -> String {
    substitute(text, ESCAPES.iter().map(|&(from, to)| (to, from)))
}

/// Replace known encoding-mismatch artifacts with the characters they stand for.
pub fn clean_encoding(text: &str) -> String {
    let mut out = text.to_string();
    for (artifact, replacement) in ENCODING_ARTIFACTS {
        if out.contains(artifact) {
            out = out.replace(artifact, replacement);
        }
    }
    out
}

fn substitute<'a>(text: &str, table: impl Iterator<Item = (&'a str, &'a str)> + Clone) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        for (from, to) in table.clone() {
            if rest.starts_with(from) && at_boundary(from, &rest[from.len()..]) {
                out.push_str(to);
                rest = &rest[from.len()..];
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Command names only match when not followed by another letter.
fn at_boundary(pattern: &str, after: &str) -> bool {
    let is_command = pattern
        .strip_prefix('\\')
        .is_some_and(|name| name.starts_with(|c: char| c.is_ascii_alphabetic()));
    !is_command
        || !after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
}
