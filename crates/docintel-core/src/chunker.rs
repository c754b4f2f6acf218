//! Splitting text into bounded, overlapping chunks.
//!
//! All strategies work on byte spans of the source text, so every produced
//! chunk is an exact (trimmed) slice of its input and carries its offsets.

use std::collections::VecDeque;
use std::ops::Range;

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, ChunkStrategy, Meta};

type Span = Range<usize>;

/// Separators tried by the recursive strategy, coarsest first.
pub const RECURSIVE_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

const PARAGRAPH_BREAK: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::invalid_argument("chunk_size must be positive"));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::invalid_argument(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    /// Build a chunker from a strategy name such as `"semantic"`.
    pub fn from_name(chunk_size: usize, chunk_overlap: usize, strategy: &str) -> Result<Self> {
        Self::new(ChunkingConfig { chunk_size, chunk_overlap, strategy: strategy.parse()? })
    }

    pub fn config(&self) -> &ChunkingConfig { &self.config }

    /// Split `text` with the configured strategy. `base` is merged into the
    /// metadata of every chunk. Blank input yields no chunks.
    pub fn chunk(&self, text: &str, base: Option<&ChunkMetadata>) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let spans: Vec<(Span, Meta)> = match self.config.strategy {
            ChunkStrategy::Recursive => self.recursive_spans(text).into_iter().map(|s| (s, Meta::new())).collect(),
            ChunkStrategy::Semantic => self
                .accumulate(text, paragraph_spans(text))
                .into_iter()
                .map(|(s, n)| (s, extra("paragraph_count", n)))
                .collect(),
            ChunkStrategy::Sentence => self
                .accumulate(text, sentence_spans(text))
                .into_iter()
                .map(|(s, n)| (s, extra("sentence_count", n)))
                .collect(),
            ChunkStrategy::Paragraph => paragraph_spans(text)
                .into_iter()
                .map(|s| (s, extra("is_single_paragraph", true)))
                .collect(),
        };
        let chunks = self.build(text, spans, base);
        debug!(strategy = %self.config.strategy, chunks = chunks.len(), chars = text.len(), "chunked text");
        chunks
    }

    fn build(&self, text: &str, spans: Vec<(Span, Meta)>, base: Option<&ChunkMetadata>) -> Vec<Chunk> {
        let total = spans.len();
        spans
            .into_iter()
            .enumerate()
            .map(|(id, (span, extra))| {
                let body = &text[span.clone()];
                let token_count = estimate_tokens(body);
                let mut metadata = base.cloned().unwrap_or_default();
                metadata.strategy = Some(self.config.strategy);
                metadata.chunk_size = Some(self.config.chunk_size);
                metadata.token_count = Some(token_count);
                metadata.total_chunks = Some(total);
                metadata.position = Some(id as f32 / total as f32);
                metadata.extra.extend(extra);
                Chunk { id, text: body.to_string(), start: span.start, end: span.end, token_count, metadata }
            })
            .collect()
    }

    fn recursive_spans(&self, text: &str) -> Vec<Span> {
        let mut out = Vec::new();
        self.split_recursive(text, 0..text.len(), &RECURSIVE_SEPARATORS, &mut out);
        out
    }

    fn split_recursive(&self, text: &str, span: Span, separators: &[&str], out: &mut Vec<Span>) {
        let body = &text[span.clone()];
        let mut chosen = ("", &separators[separators.len()..]);
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || body.contains(sep) {
                chosen = (*sep, &separators[i + 1..]);
                break;
            }
        }
        let (sep, rest) = chosen;

        let mut fitting: Vec<Span> = Vec::new();
        for piece in split_keep_separator(text, span, sep) {
            if char_len(text, &piece) < self.config.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                self.merge(text, &fitting, out);
                fitting.clear();
            }
            if rest.is_empty() {
                if let Some(s) = trim_span(text, piece) {
                    out.push(s);
                }
            } else {
                self.split_recursive(text, piece, rest, out);
            }
        }
        if !fitting.is_empty() {
            self.merge(text, &fitting, out);
        }
    }

    /// Pack contiguous pieces into windows of at most `chunk_size`
    /// characters; each new window keeps up to `chunk_overlap` characters of
    /// the previous one.
    fn merge(&self, text: &str, pieces: &[Span], out: &mut Vec<Span>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut window: VecDeque<(Span, usize)> = VecDeque::new();
        let mut total = 0usize;

        let emit = |window: &VecDeque<(Span, usize)>, out: &mut Vec<Span>| {
            if let (Some((first, _)), Some((last, _))) = (window.front(), window.back()) {
                if let Some(s) = trim_span(text, first.start..last.end) {
                    out.push(s);
                }
            }
        };

        for piece in pieces {
            let len = char_len(text, piece);
            if total + len > size && !window.is_empty() {
                emit(&window, out);
                while total > overlap || (total + len > size && total > 0) {
                    match window.pop_front() {
                        Some((_, l)) => total -= l,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), len));
            total += len;
        }
        emit(&window, out);
    }

    /// Greedy accumulation of whole units (paragraphs or sentences). When a
    /// chunk closes and overlap is enabled, its last unit seeds the next one.
    fn accumulate(&self, text: &str, units: Vec<Span>) -> Vec<(Span, usize)> {
        let mut out = Vec::new();
        let mut current: Vec<Span> = Vec::new();
        let mut size = 0usize;
        for unit in units {
            let len = char_len(text, &unit);
            match current.last().cloned() {
                Some(last) if size + len > self.config.chunk_size => {
                    out.push((current[0].start..last.end, current.len()));
                    if self.config.chunk_overlap > 0 {
                        size = char_len(text, &last) + len;
                        current = vec![last, unit];
                    } else {
                        size = len;
                        current = vec![unit];
                    }
                }
                _ => {
                    size += len;
                    current.push(unit);
                }
            }
        }
        if let (Some(first), Some(last)) = (current.first(), current.last()) {
            out.push((first.start..last.end, current.len()));
        }
        out
    }
}

/// Rough token estimate: about four tokens for every three words.
pub fn estimate_tokens(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    (word_count as f32 / 0.75) as usize
}

/// Pick a chunk size and overlap that split a text of `text_len` characters
/// into roughly `target_chunks` chunks.
pub fn optimize_chunk_size(text_len: usize, target_chunks: usize, min_overlap: usize) -> (usize, usize) {
    let chunk_size = (text_len / target_chunks.max(1)).max(200);
    let chunk_overlap = min_overlap.max(chunk_size * 12 / 100);
    (chunk_size, chunk_overlap)
}

fn extra(key: &str, value: impl ToString) -> Meta {
    Meta::from([(key.to_string(), value.to_string())])
}

fn char_len(text: &str, span: &Span) -> usize {
    text[span.clone()].chars().count()
}

fn trim_span(text: &str, span: Span) -> Option<Span> {
    let body = &text[span.clone()];
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = span.start + (body.len() - body.trim_start().len());
    Some(start..start + trimmed.len())
}

/// Split `span` on `sep`, keeping each separator attached to the piece it
/// terminates. An empty separator splits into single characters.
fn split_keep_separator(text: &str, span: Span, sep: &str) -> Vec<Span> {
    let body = &text[span.clone()];
    if sep.is_empty() {
        return body.char_indices().map(|(i, c)| span.start + i..span.start + i + c.len_utf8()).collect();
    }
    let mut pieces = Vec::new();
    let mut last = 0;
    for (i, _) in body.match_indices(sep) {
        let end = i + sep.len();
        pieces.push(span.start + last..span.start + end);
        last = end;
    }
    if last < body.len() {
        pieces.push(span.start + last..span.end);
    }
    pieces
}

fn paragraph_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for (i, _) in text.match_indices(PARAGRAPH_BREAK) {
        spans.extend(trim_span(text, last..i));
        last = i + PARAGRAPH_BREAK.len();
    }
    spans.extend(trim_span(text, last..text.len()));
    spans
}

/// Sentences end at `.`, `!` or `?` followed by whitespace.
fn sentence_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            let end = i + c.len_utf8();
            spans.extend(trim_span(text, start..end));
            start = end;
        }
    }
    spans.extend(trim_span(text, start..text.len()));
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keep_separator_attaches_separator_to_left_piece() {
        let text = "a. b. c";
        let pieces: Vec<&str> = split_keep_separator(text, 0..text.len(), ". ").into_iter().map(|s| &text[s]).collect();
        assert_eq!(pieces, vec!["a. ", "b. ", "c"]);
    }

    #[test]
    fn sentence_spans_split_on_terminators() {
        let text = "One. Two! Three? Four";
        let sentences: Vec<&str> = sentence_spans(text).into_iter().map(|s| &text[s]).collect();
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn paragraph_spans_drop_blank_paragraphs() {
        let text = "\n\nfirst\n\n   \n\nsecond\n\n";
        let paras: Vec<&str> = paragraph_spans(text).into_iter().map(|s| &text[s]).collect();
        assert_eq!(paras, vec!["first", "second"]);
    }

    #[test]
    fn trim_span_handles_multibyte_text() {
        let text = "  héllo wörld  ";
        let span = trim_span(text, 0..text.len()).expect("non blank");
        assert_eq!(&text[span], "héllo wörld");
    }
}
