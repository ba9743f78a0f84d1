// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Splits narration text into chunks the translate speech endpoint accepts

/// Longest text the translate speech endpoint reads in one request
pub const MAX_CHUNK_CHARS: usize = 100;

/// Titles whose trailing period does not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "dr", "jr", "mr", "mrs", "ms", "msgr", "mt", "prof", "sr", "st", "vs",
];

/// Clean `text` and split it into ordered chunks of at most `max_chars` characters
///
/// Breaks prefer sentence punctuation, then whitespace. Decimal points,
/// thousands separators and clock times (`3.5`, `1,000`, `10:30`) are not
/// break points, and neither are the periods of titles such as `Dr.` or
/// `Mt.`. Chunks without any letter or digit are dropped.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let cleaned = drop_abbreviation_periods(&clean_text(text));

    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in split_on_punctuation(&cleaned) {
        if !piece.chars().any(char::is_alphanumeric) {
            continue;
        }
        for part in minimize(&piece, max_chars) {
            if current.is_empty() {
                current = part;
            } else if char_len(&current) + 1 + char_len(&part) <= max_chars {
                current.push(' ');
                current.push_str(&part);
            } else {
                chunks.push(std::mem::replace(&mut current, part));
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Join hyphenated line breaks and collapse whitespace
fn clean_text(text: &str) -> String {
    text.replace("-\r\n", "")
        .replace("-\n", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove the period after known titles; the spoken result is the same
fn drop_abbreviation_periods(text: &str) -> String {
    text.split(' ')
        .map(|word| match word.strip_suffix('.') {
            Some(stem) if is_abbreviation(stem) => stem,
            _ => word,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_abbreviation(stem: &str) -> bool {
    let bare = stem.trim_start_matches(|c: char| !c.is_alphanumeric());
    ABBREVIATIONS.iter().any(|a| bare.eq_ignore_ascii_case(a))
}

fn split_on_punctuation(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if is_break(ch, chars.peek().copied()) {
            let piece = current.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
            current.clear();
        }
    }

    let piece = current.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
    pieces
}

fn is_break(ch: char, next: Option<char>) -> bool {
    match ch {
        '?' | '!' | ';' | '…' | '。' | '！' | '？' => true,
        '.' | ',' | ':' => !next.is_some_and(|n| n.is_ascii_digit()),
        _ => false,
    }
}

/// Split a piece longer than `max_chars` at the last space that fits
fn minimize(piece: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = piece.trim();

    while char_len(rest) > max_chars {
        // Byte range of the first char past the limit
        let (limit, limit_end) = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, ch)| (idx, idx + ch.len_utf8()))
            .unwrap_or((rest.len(), rest.len()));

        let split_at = match rest[..limit_end].rfind(' ') {
            Some(idx) if idx > 0 => idx,
            _ => limit,
        };

        let (head, tail) = rest.split_at(split_at);
        let head = head.trim();
        if !head.is_empty() {
            parts.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
