//! Source databases shaped like the layout and word exports.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

/// `(page, line, line_type, is_centered, first_word_id, last_word_id, surah_number)`
///
/// Optional columns are given as text so empty strings can stand for absent
/// values the way the exports store them.
pub type LayoutRow = (u16, u16, &'static str, i64, &'static str, &'static str, &'static str);

pub fn seed_layout(connection: &Connection, rows: &[LayoutRow]) {
    connection
        .execute_batch(
            "CREATE TABLE pages (
               page_number INTEGER,
               line_number INTEGER,
               line_type TEXT,
               is_centered INTEGER,
               first_word_id,
               last_word_id,
               surah_number
             );",
        )
        .expect("pages schema should be created");

    for (page, line, kind, centered, first, last, surah) in rows {
        connection
            .execute(
                "INSERT INTO pages VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![page, line, kind, centered, first, last, surah],
            )
            .expect("layout row should insert");
    }
}

/// `(surah, verse, word_count)` per verse; word indices start at 1 and each
/// word's text is `w{index}`.
pub fn seed_words(connection: &Connection, verses: &[(u16, u16, u16)]) {
    connection
        .execute_batch(
            "CREATE TABLE words (word_index INTEGER PRIMARY KEY, word_key TEXT, text TEXT);",
        )
        .expect("words schema should be created");

    let mut index = 0_i64;
    for (surah, verse, count) in verses {
        for word in 1..=*count {
            index += 1;
            connection
                .execute(
                    "INSERT INTO words VALUES (?1, ?2, ?3)",
                    params![index, format!("{surah}:{verse}:{word}"), format!("w{index}")],
                )
                .expect("word row should insert");
        }
    }
}

/// Surah 1 on page 1, surah 2 opening on page 2 and continuing onto page 3.
pub fn three_page_layout() -> Vec<LayoutRow> {
    vec![
        (1, 1, "surah_name", 1, "", "", "1"),
        (1, 2, "basmallah", 1, "", "", ""),
        (1, 3, "ayah", 0, "1", "7", ""),
        (1, 4, "ayah", 0, "8", "12", ""),
        (2, 1, "surah_name", 1, "", "", "2"),
        (2, 2, "basmallah", 1, "", "", ""),
        (2, 3, "ayah", 0, "13", "16", ""),
        (3, 1, "ayah", 0, "17", "20", ""),
        (3, 2, "ayah", 0, "21", "22", ""),
    ]
}

pub fn three_page_words() -> Vec<(u16, u16, u16)> {
    vec![(1, 1, 7), (1, 2, 5), (2, 1, 6), (2, 2, 4)]
}

pub fn write_sources(
    dir: &Path,
    layout: &[LayoutRow],
    verses: &[(u16, u16, u16)],
) -> (PathBuf, PathBuf) {
    let layout_db = dir.join("layout.sqlite");
    let words_db = dir.join("words.sqlite");

    let connection = Connection::open(&layout_db).expect("layout DB should open");
    seed_layout(&connection, layout);
    let connection = Connection::open(&words_db).expect("words DB should open");
    seed_words(&connection, verses);

    (layout_db, words_db)
}
