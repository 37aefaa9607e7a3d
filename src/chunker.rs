/*!
 * Boundary-safe text chunking.
 *
 * Text under the provider's practical size ceiling passes through as a
 * single chunk. Oversized text is split only at sentence boundaries, or at
 * block-tag boundaries for HTML-like content, and never inside a masked
 * token or a template placeholder. Reassembly is plain concatenation in
 * chunk order.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that looks like an HTML tag
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

/// Closing block-level tags and line breaks, the safe cut points in markup
static BLOCK_BOUNDARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:p|div|li|ul|ol|h[1-6]|section|article|table|tr|td|blockquote)\s*>|<br\s*/?>")
        .unwrap()
});

/// Sentence enders followed by whitespace, and newline runs
static SENTENCE_BOUNDARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?][")'\]]?\s+|\n+"#).unwrap());

/// Template placeholder spans; no cut may fall inside one
static TEMPLATE_SPAN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}|\{%.*?%\}").unwrap());

/// One boundary-safe segment of source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the ordered sequence
    pub index: usize,
    /// Segment text
    pub text: String,
    /// Whether the segment looks like HTML
    pub is_html_like: bool,
}

/// Splits oversized text into provider-sized segments
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Practical per-call size ceiling, in characters
    max_chunk_chars: usize,
}

impl Chunker {
    /// Create a chunker with the given character ceiling
    pub fn new(max_chunk_chars: usize) -> Self {
        Self { max_chunk_chars }
    }

    /// Heuristic for HTML-like content
    pub fn is_likely_html(text: &str) -> bool {
        TAG_REGEX.is_match(text)
    }

    /// Split text into an ordered, finite sequence of boundary-safe chunks
    ///
    /// Concatenating the chunk texts in order reproduces the input exactly.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let html = Self::is_likely_html(text);

        if text.chars().count() <= self.max_chunk_chars {
            return vec![Chunk {
                index: 0,
                text: text.to_string(),
                is_html_like: html,
            }];
        }

        let boundary = if html {
            &*BLOCK_BOUNDARY_REGEX
        } else {
            &*SENTENCE_BOUNDARY_REGEX
        };

        let segments = split_after_matches(text, boundary);
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;

        for segment in segments {
            let segment_chars = segment.chars().count();

            if current_chars + segment_chars > self.max_chunk_chars && !current.is_empty() {
                push_chunk(&mut chunks, std::mem::take(&mut current), html);
                current_chars = 0;
            }

            if segment_chars > self.max_chunk_chars {
                // No safe boundary inside this segment; fall back to
                // whitespace cuts. Masked tokens contain no whitespace, so
                // a whitespace cut can never land inside one.
                for piece in hard_split(segment, self.max_chunk_chars) {
                    push_chunk(&mut chunks, piece.to_string(), html);
                }
            } else {
                current.push_str(segment);
                current_chars += segment_chars;
            }
        }

        if !current.is_empty() {
            push_chunk(&mut chunks, current, html);
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: String, is_html_like: bool) {
    let index = chunks.len();
    chunks.push(Chunk {
        index,
        text,
        is_html_like,
    });
}

/// Split text into slices ending just after each regex match
///
/// Matches whose cut point would land inside a template placeholder are
/// skipped, so placeholders stay whole across segments.
fn split_after_matches<'a>(text: &'a str, boundary: &Regex) -> Vec<&'a str> {
    let spans = placeholder_spans(text);
    let mut segments = Vec::new();
    let mut start = 0;

    for m in boundary.find_iter(text) {
        if inside_placeholder(m.end(), &spans) {
            continue;
        }
        segments.push(&text[start..m.end()]);
        start = m.end();
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }

    segments
}

/// Byte ranges of template placeholders within the text
fn placeholder_spans(text: &str) -> Vec<(usize, usize)> {
    TEMPLATE_SPAN_REGEX
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Whether a cut at this byte offset would land strictly inside a placeholder
fn inside_placeholder(pos: usize, spans: &[(usize, usize)]) -> bool {
    spans.iter().any(|&(start, end)| pos > start && pos < end)
}

/// Cut an oversized boundary-free segment at whitespace
///
/// Each piece stays at or near the ceiling. Cut positions inside a
/// template placeholder are rejected, and when a window holds no usable
/// whitespace at all the cut moves forward to the next one, keeping
/// unbreakable runs (URLs, masked tokens, placeholders) intact even if a
/// piece then exceeds the ceiling.
fn hard_split(segment: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = segment;

    while rest.chars().count() > max_chars {
        let spans = placeholder_spans(rest);
        let window_end = byte_index_at_char(rest, max_chars);
        let cut = rest[..window_end]
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .filter(|&pos| !inside_placeholder(pos, &spans))
            .next_back()
            .or_else(|| {
                rest[window_end..]
                    .char_indices()
                    .filter(|(_, c)| c.is_whitespace())
                    .map(|(i, c)| window_end + i + c.len_utf8())
                    .find(|&pos| !inside_placeholder(pos, &spans))
            });

        match cut {
            Some(pos) if pos > 0 && pos < rest.len() => {
                pieces.push(&rest[..pos]);
                rest = &rest[pos..];
            }
            _ => break,
        }
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }

    pieces
}

/// Byte offset of the nth character, clamped to the string length
fn byte_index_at_char(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}
