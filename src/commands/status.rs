use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{DeckRunManifest, PagesRunManifest};
use crate::source::open_read_only;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(out_dir = %args.out_dir.display(), "status requested");

    if args.layout_db.exists() {
        let conn = open_read_only(&args.layout_db)?;
        let lines = query_count(&conn, "SELECT COUNT(*) FROM pages").unwrap_or(0);
        let pages = query_count(&conn, "SELECT COUNT(DISTINCT page_number) FROM pages").unwrap_or(0);
        let titles =
            query_count(&conn, "SELECT COUNT(*) FROM pages WHERE line_type = 'surah_name'")
                .unwrap_or(0);

        info!(
            path = %args.layout_db.display(),
            lines,
            pages,
            surah_titles = titles,
            "layout database status"
        );
    } else {
        warn!(path = %args.layout_db.display(), "layout database missing");
    }

    if args.words_db.exists() {
        let conn = open_read_only(&args.words_db)?;
        let words = query_count(&conn, "SELECT COUNT(*) FROM words").unwrap_or(0);
        info!(path = %args.words_db.display(), words, "words database status");
    } else {
        warn!(path = %args.words_db.display(), "words database missing");
    }

    if !args.out_dir.is_dir() {
        warn!(path = %args.out_dir.display(), "output directory missing");
        return Ok(());
    }

    let html_pages = count_with_extension(&args.out_dir, "html")?;
    let fonts = count_with_extension(&args.out_dir, "ttf")?;
    info!(
        path = %args.out_dir.display(),
        html_pages,
        fonts,
        stylesheet = args.out_dir.join("style.css").is_file(),
        "output directory status"
    );

    let manifest_dir = args.out_dir.join("manifests");
    match latest_manifest(&manifest_dir, "pages_run_")? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: PagesRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                pages_written = manifest.counts.pages_written,
                pages_failed = manifest.counts.pages_failed,
                "loaded latest pages run manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no pages run manifest found"),
    }

    if let Some(path) = latest_manifest(&manifest_dir, "deck_run_")? {
        let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let manifest: DeckRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(
            run_id = %manifest.run_id,
            package = %manifest.package_path,
            notes = manifest.note_count,
            media = manifest.media_count,
            "loaded latest deck run manifest"
        );
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn count_with_extension(dir: &Path, extension: &str) -> Result<usize> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;
    let mut count = 0;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == extension) {
            count += 1;
        }
    }
    Ok(count)
}

/// Manifest names carry a compact UTC timestamp, so the greatest name is the newest run.
fn latest_manifest(manifest_dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?;
    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?
            .path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix) && name.ends_with(".json"));
        if matches && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }
    Ok(latest)
}
