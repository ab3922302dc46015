const ARTICLES: [&str; 3] = ["the", "a", "an"];

/// Splits a free-text oracle answer into subtask descriptors.
///
/// Accepts `[Go to Sink], [Turn On Tap]` as well as one item per line,
/// optionally numbered (`1. Go to the Sink.`) or bulleted.
#[must_use]
pub fn parse_suggestions(text: &str) -> Vec<String> {
    if text.contains('[') {
        return text
            .split('[')
            .skip(1)
            .filter_map(|chunk| chunk.split_once(']').map(|(inner, _)| normalize(inner)))
            .filter(|item| !item.is_empty())
            .collect();
    }
    text.lines()
        .map(normalize)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Drops list markers, surrounding quotes and trailing punctuation and
/// collapses whitespace.
#[must_use]
pub fn normalize(descriptor: &str) -> String {
    let mut text = descriptor.trim();
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &text[digits..];
        if let Some(stripped) = rest.strip_prefix(['.', ')']) {
            text = stripped;
        }
    }
    text = text.trim_start_matches(['-', '*', ' ', '\t']);
    text = text.trim_matches(['"', '\'', '`']);
    text = text.trim_end_matches(['.', ',', ';', ' ']);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches `descriptor` against a template name with `arity` parameters.
///
/// Returns the extracted arguments when the descriptor starts with the name
/// (case-insensitive, at a word boundary). One parameter takes the whole
/// remainder; several take one word each. A leading article is dropped.
#[must_use]
pub fn match_template(descriptor: &str, name: &str, arity: usize) -> Option<Vec<String>> {
    if arity == 0 {
        return descriptor.eq_ignore_ascii_case(name).then(Vec::new);
    }
    let head = descriptor.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = descriptor.get(name.len()..)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut words: Vec<&str> = rest.split_whitespace().collect();
    if words.len() > 1 && ARTICLES.iter().any(|a| words[0].eq_ignore_ascii_case(a)) {
        words.remove(0);
    }
    if words.is_empty() {
        return None;
    }
    if arity == 1 {
        return Some(vec![words.join(" ")]);
    }
    (words.len() == arity).then(|| words.into_iter().map(str::to_string).collect())
}
