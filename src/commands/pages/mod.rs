use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cli::PagesArgs;
use crate::layout::{
    ComposeError, FIRST_PAGE, LAST_PAGE, PageComposer, PageTemplate, SurahIndex,
};
use crate::model::{PageFailure, PagesRunCounts, PagesRunManifest, PagesRunPaths};
use crate::source::{LayoutSource, SqliteLayout, SqliteWords};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_bytes, write_json_pretty};

mod run;
#[cfg(test)]
mod tests;
mod worker;

pub(crate) use run::load_template;
pub use run::run;

use worker::*;
