//! Sentence chunking
//!
//! Text is split at sentence boundaries and sentences are packed into
//! chunks of at most `max_chars` characters. A single sentence longer than
//! the limit is broken at word boundaries, and a single word longer than
//! the limit is cut.

/// Characters that end a sentence when followed by whitespace
const TERMINATORS: &[char] = &['.', '!', '?', ';', ':'];

/// Split `text` into sentences, ignoring terminators inside SSML tags
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut in_tag = false;
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag && TERMINATORS.contains(&c) => {
                let at_boundary = chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
                if at_boundary {
                    let end = idx + c.len_utf8();
                    let sentence = text[start..end].trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence);
                    }
                    start = end;
                }
            }
            _ => {}
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Pack sentences into chunks no longer than `max_chars`
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        for piece in split_long(sentence, max_chars) {
            let needed = if current.is_empty() {
                char_len(&piece)
            } else {
                char_len(&current) + 1 + char_len(&piece)
            };
            if needed > max_chars && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at whitespace outside tags, so a tag with attributes stays whole
fn words(sentence: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut in_tag = false;
    let mut start = None;

    for (idx, ch) in sentence.char_indices() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if c.is_whitespace() && !in_tag => {
                if let Some(s) = start.take() {
                    words.push(&sentence[s..idx]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(idx);
    }
    if let Some(s) = start {
        words.push(&sentence[s..]);
    }
    words
}

/// Cut a word that alone exceeds the limit, never inside a tag
///
/// A tag longer than the limit becomes a piece of its own.
fn cut_word(word: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut rest = word;

    while let Some(ch) = rest.chars().next() {
        let atom_len = if ch == '<' {
            rest.find('>').map_or(rest.len(), |end| end + 1)
        } else {
            ch.len_utf8()
        };
        let (atom, tail) = rest.split_at(atom_len);
        if !current.is_empty() && char_len(&current) + char_len(atom) > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(atom);
        rest = tail;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Break an overlong sentence at whitespace, cutting words that alone
/// exceed the limit
fn split_long(sentence: &str, max_chars: usize) -> Vec<String> {
    if char_len(sentence) <= max_chars {
        return vec![sentence.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in words(sentence) {
        let word_len = char_len(word);
        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(cut_word(word, max_chars));
            continue;
        }
        let needed = if current.is_empty() {
            word_len
        } else {
            char_len(&current) + 1 + word_len
        };
        if needed > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
