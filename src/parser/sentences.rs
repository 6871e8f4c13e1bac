//! Text normalization and sentence splitting

use regex::Regex;
use std::sync::LazyLock;

static REMINDER_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static MODAL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^choose (?:one|two|three|one or more|one or both)\b").unwrap());

/// Fold typographic characters to ASCII and drop reminder text
///
/// When `card_name` is given, self-references by name (and the `~` and
/// `CARDNAME` placeholders used by card files) become "this permanent".
pub fn normalize(text: &str, card_name: Option<&str>) -> String {
    let mut text = deunicode::deunicode(text);
    text = REMINDER_TEXT.replace_all(&text, "").into_owned();
    if let Some(name) = card_name.filter(|n| !n.trim().is_empty()) {
        text = text.replace(deunicode::deunicode(name).as_str(), "this permanent");
    }
    text = text.replace("CARDNAME", "this permanent").replace('~', "this permanent");
    text.lines()
        .map(|line| WHITESPACE.replace_all(line.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('*') || line.starts_with('-') || line.starts_with('\u{2022}')
}

/// Split normalized text into sentences
///
/// Lines are split on periods outside `{...}` symbol groups. A modal header
/// ("Choose one --") keeps its bullet lines with it as one block, with modes
/// separated by `;`.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();

    while let Some(line) = lines.next() {
        if MODAL_HEADER.is_match(line) {
            let mut block = line.trim_end_matches('.').to_string();
            while let Some(next) = lines.peek() {
                if !is_bullet(next) {
                    break;
                }
                let mode = next.trim_start_matches(['*', '-', '\u{2022}', ' ']);
                block.push_str(if block.ends_with('-') { " " } else { "; " });
                block.push_str(mode.trim_end_matches('.'));
                lines.next();
            }
            sentences.push(block);
            continue;
        }
        split_line(line, &mut sentences);
    }
    sentences
}

fn split_line(line: &str, out: &mut Vec<String>) {
    let mut depth = 0usize;
    let mut current = String::new();
    for c in line.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c == '.' && depth == 0 {
            push_sentence(&mut current, out);
        } else {
            current.push(c);
        }
    }
    push_sentence(&mut current, out);
}

fn push_sentence(current: &mut String, out: &mut Vec<String>) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
    current.clear();
}
