//! Page-layout reconstruction: flat line and word records in, one finished
//! markup document per page out.

mod compose;
mod error;
mod header;
mod line;
mod nodes;
mod numerals;
mod surah_index;
mod template;

pub use compose::PageComposer;
pub use error::{ComposeError, ComposeResult};
pub use numerals::{FIRST_PAGE, LAST_PAGE, font_file_name};
pub use surah_index::SurahIndex;
pub use template::PageTemplate;
