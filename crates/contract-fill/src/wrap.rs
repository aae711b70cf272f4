//! Line wrapping for free-text fields
//!
//! Fixed-width wrapping at word boundaries, counted in characters rather
//! than glyph widths: the special-conditions box was tuned against the
//! template with a character budget, not a metric one.

/// Wrap `text` into lines of at most `max_chars` characters, breaking at
/// word boundaries. A single word longer than the limit is hard-broken.
/// Empty or whitespace-only input yields no lines.
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    debug_assert!(max_chars > 0);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            // Flush whatever is pending, then hard-break the word.
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                let piece: String = chunk.iter().collect();
                if chunk.len() == max_chars {
                    lines.push(piece);
                } else {
                    // Tail shorter than a full line starts the next one.
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        let needed = if current_len == 0 {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
            current_len = word_len;
        } else {
            if current_len > 0 {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
