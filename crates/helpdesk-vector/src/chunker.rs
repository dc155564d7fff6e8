//! Paragraph-aware text chunking.
//!
//! Splits a document into bounded-size units for the retrieval index.
//! Paragraphs (separated by blank lines) are packed greedily into chunks of
//! at most `max_chars` characters; a paragraph that is too long on its own
//! is cut into fixed-length slices instead.

/// Default upper bound on chunk length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 800;

/// Separator placed between paragraphs that share a chunk.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into chunks of at most `max_chars` characters each.
///
/// Lengths are counted in `char`s, so multi-byte text is never cut inside a
/// character. Chunks preserve document order. Empty or whitespace-only
/// input yields no chunks. A `max_chars` of zero is treated as one.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let separator_len = PARAGRAPH_SEPARATOR.chars().count();

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0usize;

    for para in paragraphs(text) {
        let para_len = para.chars().count();
        let candidate_len = if buf.is_empty() {
            para_len
        } else {
            buf_len + separator_len + para_len
        };

        if candidate_len <= max_chars {
            if !buf.is_empty() {
                buf.push_str(PARAGRAPH_SEPARATOR);
            }
            buf.push_str(&para);
            buf_len = candidate_len;
            continue;
        }

        if !buf.is_empty() {
            chunks.push(std::mem::take(&mut buf));
            buf_len = 0;
        }

        if para_len <= max_chars {
            buf = para;
            buf_len = para_len;
        } else {
            chunks.extend(hard_split(&para, max_chars));
        }
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }

    chunks
}

/// Non-empty, trimmed paragraphs in document order.
///
/// A paragraph boundary is any line that is empty or whitespace-only.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut out);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut out);

    out
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

/// Consecutive slices of exactly `max_chars` characters; the last may be shorter.
fn hard_split(para: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = para.chars().collect();
    chars
        .chunks(max_chars)
        .map(|slice| slice.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(chunk_text("", 800).is_empty());
        assert!(chunk_text("   \n\n  \n", 800).is_empty());
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks = chunk_text("Hello there.\n\nSecond paragraph.", 800);
        assert_eq!(chunks, vec!["Hello there.\n\nSecond paragraph.".to_string()]);
    }

    #[test]
    fn test_paragraphs_are_trimmed() {
        let chunks = chunk_text("   padded   \n\n\n\n  also padded  ", 800);
        assert_eq!(chunks, vec!["padded\n\nalso padded".to_string()]);
    }

    #[test]
    fn test_whitespace_only_line_is_a_boundary() {
        let chunks = chunk_text("alpha\n   \nbeta", 5);
        assert_eq!(chunks, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_single_newlines_stay_inside_paragraph() {
        let chunks = chunk_text("line one\nline two", 800);
        assert_eq!(chunks, vec!["line one\nline two".to_string()]);
    }

    #[test]
    fn test_flushes_when_next_paragraph_does_not_fit() {
        // "aaaa" + "\n\n" + "bbbb" = 10 chars, over the limit of 9.
        let chunks = chunk_text("aaaa\n\nbbbb\n\ncc", 9);
        assert_eq!(chunks, vec!["aaaa".to_string(), "bbbb\n\ncc".to_string()]);
    }

    #[test]
    fn test_exact_fit_is_merged() {
        // 4 + 2 + 4 = 10.
        let chunks = chunk_text("aaaa\n\nbbbb", 10);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb".to_string()]);
    }

    #[test]
    fn test_paragraph_of_exactly_max_chars_is_not_split() {
        let para = "x".repeat(20);
        let chunks = chunk_text(&para, 20);
        assert_eq!(chunks, vec![para]);
    }

    #[test]
    fn test_long_paragraph_is_hard_split() {
        let para = "abcdefghij".repeat(3); // 30 chars
        let chunks = chunk_text(&para, 8);
        assert_eq!(
            chunks,
            vec!["abcdefgh", "ijabcdef", "ghijabcd", "efghij"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_hard_split_flushes_pending_buffer_first() {
        let text = format!("intro\n\n{}\n\noutro", "z".repeat(12));
        let chunks = chunk_text(&text, 5);
        assert_eq!(chunks, vec!["intro", "zzzzz", "zzzzz", "zz", "outro"]);
    }

    #[test]
    fn test_hard_split_respects_char_boundaries() {
        let para = "é".repeat(7);
        let chunks = chunk_text(&para, 3);
        assert_eq!(chunks, vec!["ééé", "ééé", "é"]);
    }

    #[test]
    fn test_zero_max_chars_treated_as_one() {
        let chunks = chunk_text("abc", 0);
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_every_chunk_within_bound() {
        let text = (0..40)
            .map(|i| "word ".repeat(i * 7 % 50 + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        for max in [1, 7, 50, 120, 800] {
            for chunk in chunk_text(&text, max) {
                assert!(
                    char_len(&chunk) <= max,
                    "chunk of {} chars exceeds {}",
                    char_len(&chunk),
                    max
                );
                assert!(!chunk.is_empty());
            }
        }
    }

    #[test]
    fn test_paragraph_order_preserved() {
        let paras: Vec<String> = (0..25).map(|i| format!("paragraph-{:02}", i)).collect();
        let text = paras.join("\n\n");
        let chunks = chunk_text(&text, 40);
        assert!(chunks.len() > 1);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.split(PARAGRAPH_SEPARATOR).map(String::from))
            .collect();
        assert_eq!(rejoined, paras);
    }

    #[test]
    fn test_default_max_chars() {
        let text = "y".repeat(DEFAULT_MAX_CHARS * 2 + 1);
        let chunks = chunk_text(&text, DEFAULT_MAX_CHARS);
        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[2]), 1);
    }
}
