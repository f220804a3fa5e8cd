use crate::model::{LineKind, LineRecord, VerseKey, WordRecord};

use super::error::{ComposeError, ComposeResult};
use super::nodes::{CharSpanNode, LineNode, VerseBlockNode};

const WORD_SEPARATOR: char = ' ';

/// Renders one layout line. `words` is only read for ordinary lines and must
/// be the exact slice covered by the line's word range.
pub fn render_line(record: &LineRecord, words: &[WordRecord]) -> ComposeResult<LineNode> {
    match record.kind {
        LineKind::SectionTitle => {
            let surah = record
                .surah_number
                .ok_or_else(|| ComposeError::MalformedLine {
                    page: record.page_number,
                    line: record.line_number,
                    reason: "surah title line has no surah number".to_string(),
                })?;
            Ok(LineNode::SectionTitle {
                line: record.line_number,
                surah,
            })
        }
        LineKind::OpeningFormula => Ok(LineNode::OpeningFormula {
            line: record.line_number,
        }),
        LineKind::Ordinary => {
            if words.is_empty() {
                return Err(ComposeError::MalformedLine {
                    page: record.page_number,
                    line: record.line_number,
                    reason: "ordinary line resolved to zero words".to_string(),
                });
            }

            Ok(LineNode::Words {
                line: record.line_number,
                centered: record.centered,
                verses: group_verses(words),
            })
        }
    }
}

/// Splits words into verse blocks on every change of verse identity.
/// Input order is trusted; nothing is re-sorted.
fn group_verses(words: &[WordRecord]) -> Vec<VerseBlockNode> {
    let mut verses = Vec::<VerseBlockNode>::new();
    let mut open_verse: Option<VerseKey> = None;

    for word in words {
        if !open_verse.is_some_and(|key| key.same_verse(word.key)) {
            open_verse = Some(word.key);
            verses.push(VerseBlockNode {
                surah: word.key.surah,
                verse: word.key.verse,
                activation_hint: format!("handleAyahClick('{}')", word.key.verse_ref()),
                spans: Vec::new(),
            });
        }

        let mut text = String::with_capacity(word.text.len() + 1);
        text.push_str(&word.text);
        text.push(WORD_SEPARATOR);

        if let Some(current) = verses.last_mut() {
            current.spans.push(CharSpanNode {
                text,
                verse_final: word.is_last_word_of_verse,
            });
        }
    }

    verses
}
