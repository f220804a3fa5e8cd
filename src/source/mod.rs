//! Read-only collaborators that feed the layout engine.

mod sqlite;

pub use sqlite::{SqliteLayout, SqliteWords, open_read_only};

use crate::layout::ComposeResult;
use crate::model::{LineRecord, VerseKey, WordRecord};

pub trait LayoutSource {
    /// Lines of one page ordered by line number.
    fn fetch_lines(&self, page_number: u16) -> ComposeResult<Vec<LineRecord>>;

    /// Every surah-title line of the whole text, ordered by page then line.
    fn fetch_section_titles(&self) -> ComposeResult<Vec<LineRecord>>;
}

pub trait WordSource {
    /// Words with `first <= index <= last`, ordered by index. The verse-final
    /// flag is left unset; the composer fills it in with [`WordSource::word_exists`].
    fn fetch_words(&self, first_index: i64, last_index: i64) -> ComposeResult<Vec<WordRecord>>;

    fn word_exists(&self, key: VerseKey) -> ComposeResult<bool>;
}
