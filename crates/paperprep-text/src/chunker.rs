//! Recursive, separator-priority text chunking.
//!
//! A span is split on the first separator (in priority order) that occurs in
//! it. Fragments shorter than `chunk_size` are packed greedily and rejoined
//! with that separator; a fragment that is too long is split again with the
//! remaining, finer separators. The empty separator splits into characters.
//! Separators are dropped at split time, emitted chunks are trimmed, and
//! lengths count chars rather than bytes.

use std::collections::VecDeque;

use tracing::warn;

use paperprep_core::config::ChunkConfig;
use paperprep_core::error::Result;
use paperprep_core::types::Chunk;

#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkConfig,
}

impl RecursiveChunker {
    /// Fails with `InvalidChunkConfig` for a zero size, an overlap that is
    /// not smaller than the size, or an empty separator list.
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.split_recursive(text, &self.config.separators, &mut out);
        out
    }

    pub fn chunks(&self, text: &str) -> Vec<Chunk> {
        self.split_text(text).into_iter().enumerate().map(|(index, text)| Chunk { text, index }).collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String], out: &mut Vec<String>) {
        let (separator, finer) = pick_separator(text, separators);
        let mut pending: Vec<&str> = Vec::new();
        for fragment in split_on(text, separator) {
            if char_len(fragment) < self.config.chunk_size {
                pending.push(fragment);
                continue;
            }
            if !pending.is_empty() {
                self.merge(&pending, separator, out);
                pending.clear();
            }
            if finer.is_empty() {
                let unit = fragment.trim();
                if !unit.is_empty() {
                    if char_len(unit) > self.config.chunk_size {
                        warn!(len = char_len(unit), chunk_size = self.config.chunk_size, "emitting oversized unsplittable chunk");
                    }
                    out.push(unit.to_string());
                }
            } else {
                self.split_recursive(fragment, finer, out);
            }
        }
        if !pending.is_empty() {
            self.merge(&pending, separator, out);
        }
    }

    /// Packs fragments into chunks of at most `chunk_size` chars. When a chunk
    /// closes, its trailing fragments totalling at most `chunk_overlap` chars
    /// seed the next one.
    fn merge(&self, fragments: &[&str], separator: &str, out: &mut Vec<String>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let sep_len = char_len(separator);
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &fragment in fragments {
            let len = char_len(fragment);
            if !window.is_empty() && total + len + sep_len > size {
                push_joined(&window, separator, out);
                while total > overlap || (total > 0 && total + len + joiner_len(&window, sep_len) > size) {
                    let Some(first) = window.pop_front() else { break };
                    total = total.saturating_sub(char_len(first) + joiner_len(&window, sep_len));
                }
            }
            window.push_back(fragment);
            if window.len() > 1 {
                total += sep_len;
            }
            total += len;
        }
        push_joined(&window, separator, out);
    }
}

/// Splits `text` with the given chunk settings, returning chunk texts in order.
pub fn chunk(text: &str, chunk_size: usize, chunk_overlap: usize, separators: &[&str]) -> Result<Vec<String>> {
    let config = ChunkConfig {
        chunk_size,
        chunk_overlap,
        separators: separators.iter().map(|s| (*s).to_string()).collect(),
    };
    Ok(RecursiveChunker::new(config)?.split_text(text))
}

fn pick_separator<'a>(text: &str, separators: &'a [String]) -> (&'a str, &'a [String]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() {
            return (separator.as_str(), &[]);
        }
        if text.contains(separator.as_str()) {
            return (separator.as_str(), &separators[i + 1..]);
        }
    }
    (separators.last().map_or("", String::as_str), &[])
}

fn split_on<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn push_joined(window: &VecDeque<&str>, separator: &str, out: &mut Vec<String>) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn joiner_len(window: &VecDeque<&str>, sep_len: usize) -> usize {
    if window.is_empty() { 0 } else { sep_len }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
