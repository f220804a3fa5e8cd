use tracing::debug;

use crate::model::{LineKind, LineRecord, WordRecord};
use crate::source::{LayoutSource, WordSource};

use super::error::{ComposeError, ComposeResult};
use super::header::{build_controls, build_header};
use super::line::render_line;
use super::nodes::{LineContainerNode, PageChild};
use super::numerals::{determine_juz, font_file_name, page_file_name};
use super::surah_index::SurahIndex;
use super::template::{PageDocument, PageTemplate};

pub const FONT_FAMILY: &str = "v4-tajweed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPage {
    pub page_number: u16,
    pub file_name: String,
    pub markup: String,
    pub header_surah: u16,
    pub line_count: usize,
    pub word_count: usize,
}

/// Turns the layout and word records of one page into a finished document.
///
/// The composer only reads from its collaborators, so one instance can be
/// reused for any number of pages in any order.
pub struct PageComposer<'a> {
    layout: &'a dyn LayoutSource,
    words: &'a dyn WordSource,
    template: &'a PageTemplate,
    surahs: &'a SurahIndex,
}

/// A page while it is being composed. Finalizing consumes it.
struct PageAssembly {
    page_number: u16,
    document: PageDocument,
    line_count: usize,
    word_count: usize,
}

impl<'a> PageComposer<'a> {
    pub fn new(
        layout: &'a dyn LayoutSource,
        words: &'a dyn WordSource,
        template: &'a PageTemplate,
        surahs: &'a SurahIndex,
    ) -> Self {
        Self {
            layout,
            words,
            template,
            surahs,
        }
    }

    pub fn compose(&self, page_number: u16) -> ComposeResult<ComposedPage> {
        let lines = self.layout.fetch_lines(page_number)?;
        let Some(first_line) = lines.first() else {
            return Err(ComposeError::LookupMiss {
                what: format!("no layout lines for page {page_number}"),
            });
        };

        let header_surah = self.header_surah(first_line)?;
        let mut assembly = PageAssembly {
            page_number,
            document: self.template.fresh_page(),
            line_count: 0,
            word_count: 0,
        };

        assembly
            .document
            .prepend_child(PageChild::Header(build_header(
                header_surah,
                page_number,
                determine_juz(page_number),
            )));

        for record in &lines {
            let words = match record.kind {
                LineKind::Ordinary => self.resolve_words(record)?,
                LineKind::SectionTitle | LineKind::OpeningFormula => Vec::new(),
            };
            let line = render_line(record, &words)?;

            assembly.line_count += 1;
            assembly.word_count += words.len();
            assembly
                .document
                .push_child(PageChild::Line(LineContainerNode {
                    line_number: record.line_number,
                    line,
                }));
        }

        assembly
            .document
            .push_child(PageChild::Controls(build_controls(page_number)));
        assembly
            .document
            .style_mut()
            .append(&font_face_declaration(page_number));

        debug!(
            page = page_number,
            lines = assembly.line_count,
            words = assembly.word_count,
            surah = header_surah,
            "composed page"
        );

        Ok(assembly.finalize(header_surah))
    }

    fn header_surah(&self, first_line: &LineRecord) -> ComposeResult<u16> {
        if first_line.kind != LineKind::SectionTitle {
            return Ok(self.surahs.open_at_start(first_line.page_number));
        }

        first_line
            .surah_number
            .ok_or_else(|| ComposeError::MalformedLine {
                page: first_line.page_number,
                line: first_line.line_number,
                reason: "surah title line has no surah number".to_string(),
            })
    }

    /// Fetches the words of an ordinary line and flags verse-final words by
    /// probing for the next word of the same verse.
    fn resolve_words(&self, record: &LineRecord) -> ComposeResult<Vec<WordRecord>> {
        let malformed = |reason: String| ComposeError::MalformedLine {
            page: record.page_number,
            line: record.line_number,
            reason,
        };

        let (first, last) = record
            .word_range
            .ok_or_else(|| malformed("ordinary line has no word range".to_string()))?;
        if last < first {
            return Err(malformed(format!("word range {first}..{last} is reversed")));
        }

        let mut words = self.words.fetch_words(first, last)?;
        if words.is_empty() {
            return Err(malformed(format!(
                "ordinary line resolved to zero words for range {first}..{last}"
            )));
        }

        let expected = usize::try_from(last - first + 1).unwrap_or(usize::MAX);
        if words.len() != expected {
            return Err(ComposeError::LookupMiss {
                what: format!(
                    "page {} line {}: expected {expected} words in {first}..{last}, found {}",
                    record.page_number,
                    record.line_number,
                    words.len()
                ),
            });
        }

        for word in &mut words {
            word.is_last_word_of_verse = match word.key.next_word() {
                Some(next) => !self.words.word_exists(next)?,
                None => true,
            };
        }

        Ok(words)
    }
}

impl PageAssembly {
    fn finalize(self, header_surah: u16) -> ComposedPage {
        ComposedPage {
            page_number: self.page_number,
            file_name: page_file_name(self.page_number),
            markup: self.document.serialize(),
            header_surah,
            line_count: self.line_count,
            word_count: self.word_count,
        }
    }
}

pub fn font_face_declaration(page_number: u16) -> String {
    format!(
        "
    @font-face {{
        font-family: '{FONT_FAMILY}';
        src: url('{}?v=1') format('truetype');
        font-display: swap;
    }}
    ",
        font_file_name(page_number)
    )
}
