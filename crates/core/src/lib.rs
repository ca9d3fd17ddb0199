//! strata - layout reconstruction, search and table inference over
//! positioned glyphs.
//!
//! Input is a decoded page: glyphs and graphics with top-down bounding
//! boxes. Output is plain data: rendered text, words, search matches, and
//! tables of cells.

pub mod classify;
pub mod clustering;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod objects;
pub mod page;
pub mod search;
pub mod selection;
pub mod table;

pub use error::{Result, StrataError};
pub use geometry::{BBox, HasBBox};
pub use layout::{DedupeOptions, TextSettings, Word, dedupe_chars, extract_text, extract_words};
pub use objects::{Glyph, ObjectType, PageObject};
pub use page::{Document, Page, PageSource};
pub use search::{SearchMatch, SearchOptions, search_text};
pub use table::{Table, TableFinder, TableSettings};
