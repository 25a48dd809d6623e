//! Text cleanup and sentence segmentation

/// Collapse whitespace, normalize curly apostrophes and strip a trailing
/// period or comma.
pub fn clean(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let normalized = collapsed.replace(['\u{2019}', '\u{2018}'], "'");
    normalized
        .trim_end_matches('.')
        .trim_end_matches(',')
        .trim_end()
        .to_string()
}

/// Split free text into cleaned sentences.
///
/// A boundary is one or more of `. ! ? ;` followed by whitespace or the end
/// of input, so decimals like `3.5` stay intact.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !is_terminator(ch) {
            continue;
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = next_idx + next.len_utf8();
            chars.next();
        }
        let at_boundary = match chars.peek() {
            Some(&(_, next)) => next.is_whitespace(),
            None => true,
        };
        if at_boundary {
            push_sentence(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | ';')
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim().trim_end_matches(['!', '?', ';']);
    let sentence = clean(trimmed);
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}
