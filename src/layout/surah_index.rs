use crate::model::{LineKind, LineRecord};

/// Which surah is still open when a page begins.
///
/// Built in one pass over every surah-title line before composition starts,
/// then shared read-only, so pages can be composed in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurahIndex {
    /// `open_at_start[page - 1]`; 0 until the first title is seen.
    open_at_start: Vec<u16>,
    /// Open surah after the last indexed page.
    open_after_last: u16,
    titles_indexed: usize,
}

impl SurahIndex {
    /// `titles` must be ordered by page then line. Non-title records and
    /// titles without a surah number are ignored.
    pub fn build(titles: &[LineRecord], last_page: u16) -> Self {
        let mut open_at_start = Vec::with_capacity(usize::from(last_page));
        let mut titles_indexed = 0;
        let mut current = 0_u16;
        let mut pending = titles
            .iter()
            .filter(|record| record.kind == LineKind::SectionTitle)
            .filter_map(|record| record.surah_number.map(|surah| (record.page_number, surah)))
            .peekable();

        for page in 1..=last_page {
            open_at_start.push(current);
            while let Some((_, surah)) = pending.next_if(|(title_page, _)| *title_page <= page) {
                current = surah;
                titles_indexed += 1;
            }
        }

        Self {
            open_at_start,
            open_after_last: current,
            titles_indexed,
        }
    }

    /// Pages past the indexed range see the surah left open after it.
    pub fn open_at_start(&self, page_number: u16) -> u16 {
        let slot = usize::from(page_number.max(1)) - 1;
        self.open_at_start
            .get(slot)
            .copied()
            .unwrap_or(self.open_after_last)
    }

    pub fn titles_indexed(&self) -> usize {
        self.titles_indexed
    }
}
