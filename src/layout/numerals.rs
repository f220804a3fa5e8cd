pub const FIRST_PAGE: u16 = 1;
pub const LAST_PAGE: u16 = 604;
pub const JUZ_COUNT: u16 = 30;
pub const PAGES_PER_JUZ: u16 = 20;

const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

pub fn to_localized_numeral(number: u32) -> String {
    number
        .to_string()
        .chars()
        .filter_map(|digit| digit.to_digit(10))
        .map(|digit| ARABIC_INDIC_DIGITS[digit as usize])
        .collect()
}

/// The last juz is longer than twenty pages; everything past it clamps to 30.
pub fn determine_juz(page_number: u16) -> u16 {
    (page_number.saturating_sub(1) / PAGES_PER_JUZ + 1).min(JUZ_COUNT)
}

pub fn page_file_name(page_number: u16) -> String {
    format!("{page_number:03}.html")
}

pub fn font_file_name(page_number: u16) -> String {
    format!("_p{page_number}.ttf")
}
