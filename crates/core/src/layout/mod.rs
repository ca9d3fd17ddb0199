//! Text layout reconstruction.
//!
//! Turns unordered positioned glyphs into lines, words and a rendered text
//! string, and removes overprinted duplicate glyphs.

mod dedupe;
mod text;
mod types;

pub(crate) use dedupe::dedupe_indices;
pub use dedupe::{DedupeAttr, DedupeOptions, dedupe_chars};
pub use text::{extract_text, extract_text_from_refs, extract_words, extract_words_from_refs};
pub use types::{TextSettings, Word};
