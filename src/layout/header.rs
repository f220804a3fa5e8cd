use super::nodes::{ControlsNode, HeaderNode};
use super::numerals::{FIRST_PAGE, LAST_PAGE, to_localized_numeral};

/// Surah 0 means no surah has opened yet; the header is still built and the
/// surah-specific icon simply has no glyph.
pub fn build_header(surah_number: u16, page_number: u16, juz_number: u16) -> HeaderNode {
    HeaderNode {
        surah: surah_number,
        page_numeral: to_localized_numeral(u32::from(page_number)),
        juz_numeral: to_localized_numeral(u32::from(juz_number)),
    }
}

pub fn build_controls(page_number: u16) -> ControlsNode {
    ControlsNode {
        previous_page: (page_number > FIRST_PAGE).then(|| page_number - 1),
        next_page: (page_number < LAST_PAGE).then(|| page_number + 1),
    }
}
