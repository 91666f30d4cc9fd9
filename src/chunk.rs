//! Sentence-aware text chunker with character overlap.
//!
//! Splits extracted document text into chunks of at most `chunk_size`
//! characters. Sentences are packed greedily; when a chunk closes, the last
//! `overlap` characters of it seed the next one so neighbouring chunks share
//! context. Sentences that are too long on their own are re-split on word
//! boundaries.
//!
//! # Algorithm
//!
//! 1. Collapse every whitespace run to a single space and trim the ends.
//! 2. If the result fits in `chunk_size`, return it as the only chunk.
//! 3. Split into sentences after `.`, `!` or `?` followed by whitespace.
//!    Abbreviations and decimals are not special-cased.
//! 4. Accumulate sentences. When `buffer + sentence` would exceed
//!    `chunk_size`, close the buffer and seed the next one with the closed
//!    buffer's last `overlap` characters (which may cut a word in half).
//! 5. Flush the final buffer.
//! 6. Re-split any chunk still over `chunk_size` on words. A single word
//!    longer than `chunk_size` is emitted whole.
//!
//! Lengths are counted in `char`s, not bytes.
//!
//! # Example
//!
//! ```rust
//! use docpipe::chunk::chunk_text;
//!
//! let chunks = chunk_text("Hello   world.\n\nSecond sentence.", 1000, 200);
//! assert_eq!(chunks, vec!["Hello world. Second sentence.".to_string()]);
//! ```

/// Split `text` into ordered chunks of at most `chunk_size` characters.
///
/// `overlap` is not checked against `chunk_size`; an overlap at or above the
/// chunk size makes every new chunk start with the whole previous one.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    if char_len(&normalized) <= chunk_size {
        return vec![normalized];
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;

    for sentence in split_sentences(&normalized) {
        let sentence_len = char_len(sentence);

        if buf_len + sentence_len > chunk_size && !buf.is_empty() {
            chunks.push(buf.trim().to_string());

            if overlap > 0 && buf_len > overlap {
                let tail = tail_chars(&buf, overlap);
                let mut next = String::with_capacity(tail.len() + 1 + sentence.len());
                next.push_str(tail);
                next.push(' ');
                next.push_str(sentence);
                buf = next;
                buf_len = overlap + 1 + sentence_len;
            } else {
                buf = sentence.to_string();
                buf_len = sentence_len;
            }
        } else if buf.is_empty() {
            buf.push_str(sentence);
            buf_len = sentence_len;
        } else {
            buf.push(' ');
            buf.push_str(sentence);
            buf_len += 1 + sentence_len;
        }
    }

    if !buf.trim().is_empty() {
        chunks.push(buf.trim().to_string());
    }

    let mut out = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if char_len(&chunk) <= chunk_size {
            out.push(chunk);
        } else {
            split_on_words(&chunk, chunk_size, &mut out);
        }
    }
    out
}

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split whitespace-normalized text after sentence terminators.
///
/// A boundary is a `.`, `!` or `?` immediately followed by whitespace; the
/// whitespace itself is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev_terminal = false;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if prev_terminal && c.is_whitespace() {
            sentences.push(&text[start..i]);
            let mut next_start = i + c.len_utf8();
            while let Some(&(j, w)) = iter.peek() {
                if !w.is_whitespace() {
                    break;
                }
                next_start = j + w.len_utf8();
                iter.next();
            }
            start = next_start;
            prev_terminal = false;
            continue;
        }
        prev_terminal = matches!(c, '.' | '!' | '?');
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Greedy word packing for a chunk that is still oversized.
fn split_on_words(chunk: &str, chunk_size: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in chunk.split_whitespace() {
        let word_len = char_len(word);
        if current_len + word_len + 1 <= chunk_size {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        } else {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s` (all of `s` if it is shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}
