use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::DeckArgs;
use crate::commands::pages::load_template;
use crate::layout::font_file_name;
use crate::model::{DeckNoteEntry, DeckRunManifest};
use crate::util::{
    ensure_directory, now_utc_string, read_text, sha256_hex, utc_compact_string,
    write_json_pretty,
};

mod archive;
mod collection;
mod extract;
mod ids;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use archive::*;
use collection::*;
use extract::*;
use ids::*;
