use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a word inside the text: surah, verse within the surah, word within the verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseKey {
    pub surah: u16,
    pub verse: u16,
    pub word: u16,
}

impl VerseKey {
    pub fn new(surah: u16, verse: u16, word: u16) -> Self {
        Self {
            surah,
            verse,
            word,
        }
    }

    /// `None` once the word number cannot grow, so no later word can exist.
    pub fn next_word(self) -> Option<Self> {
        Some(Self {
            word: self.word.checked_add(1)?,
            ..self
        })
    }

    pub fn same_verse(self, other: Self) -> bool {
        self.surah == other.surah && self.verse == other.verse
    }

    /// `surah:verse`, the identity shared by every word of one verse.
    pub fn verse_ref(self) -> String {
        format!("{}:{}", self.surah, self.verse)
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.surah, self.verse, self.word)
    }
}

impl FromStr for VerseKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.trim().split(':');
        let mut next = |label: &str| -> Result<u16, String> {
            parts
                .next()
                .ok_or_else(|| format!("verse key `{raw}` is missing the {label} component"))?
                .parse::<u16>()
                .map_err(|_| format!("verse key `{raw}` has a non-numeric {label} component"))
        };

        let surah = next("surah")?;
        let verse = next("verse")?;
        let word = next("word")?;
        if parts.next().is_some() {
            return Err(format!("verse key `{raw}` has more than three components"));
        }

        Ok(Self::new(surah, verse, word))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub index: i64,
    pub key: VerseKey,
    pub text: String,
    pub is_last_word_of_verse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Ordinary,
    SectionTitle,
    OpeningFormula,
}

impl LineKind {
    /// Maps the `line_type` column of the layout database.
    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ayah" => Some(Self::Ordinary),
            "surah_name" => Some(Self::SectionTitle),
            "basmallah" => Some(Self::OpeningFormula),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub page_number: u16,
    pub line_number: u16,
    pub kind: LineKind,
    pub centered: bool,
    pub word_range: Option<(i64, i64)>,
    pub surah_number: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: u16,
    pub line: Option<u16>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesRunCounts {
    pub pages_requested: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
    pub lines_rendered: usize,
    pub words_rendered: usize,
    pub surah_titles_indexed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesRunPaths {
    pub layout_db: String,
    pub words_db: String,
    pub template: String,
    pub out_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub first_page: u16,
    pub last_page: u16,
    pub jobs: usize,
    pub paths: PagesRunPaths,
    pub counts: PagesRunCounts,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckNoteEntry {
    pub page_num: String,
    pub guid: String,
    pub note_id: i64,
    pub font_bundled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub package_path: String,
    pub package_sha256: String,
    pub deck_id: i64,
    pub deck_name: String,
    pub model_id: i64,
    pub model_name: String,
    pub note_count: usize,
    pub media_count: usize,
    pub notes: Vec<DeckNoteEntry>,
    pub warnings: Vec<String>,
}
