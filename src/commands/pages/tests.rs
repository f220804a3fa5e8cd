use std::fs;

use super::*;
use super::run::validate_page_range;
use crate::fixtures::{LayoutRow, three_page_layout, three_page_words, write_sources};

fn pages_args(dir: &Path, layout_db: PathBuf, words_db: PathBuf, jobs: usize) -> PagesArgs {
    PagesArgs {
        layout_db,
        words_db,
        template_path: None,
        out_dir: dir.join("pages"),
        first_page: 1,
        last_page: 3,
        jobs,
        manifest_path: Some(dir.join("run.json")),
        dry_run: false,
    }
}

fn read_manifest(path: &Path) -> PagesRunManifest {
    let raw = fs::read(path).expect("manifest should be written");
    serde_json::from_slice(&raw).expect("manifest should parse")
}

#[test]
fn run_writes_every_page_stylesheet_and_manifest() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (layout_db, words_db) =
        write_sources(dir.path(), &three_page_layout(), &three_page_words());
    let args = pages_args(dir.path(), layout_db, words_db, 2);

    run(args).expect("page run should succeed");

    let out_dir = dir.path().join("pages");
    for name in ["001.html", "002.html", "003.html", "style.css"] {
        assert!(out_dir.join(name).is_file(), "{name} should be written");
    }

    let third = fs::read_to_string(out_dir.join("003.html")).expect("page 3 should be readable");
    assert!(
        third.contains(r#"<span class="icon-surah icon-surah2"></span></div></div>"#),
        "page 3 header should show the surah opened on page 2"
    );
    assert!(third.contains("url('_p3.ttf?v=1')"));

    let manifest = read_manifest(&dir.path().join("run.json"));
    assert_eq!(manifest.status, "completed");
    assert_eq!(manifest.counts.pages_written, 3);
    assert_eq!(manifest.counts.pages_failed, 0);
    assert_eq!(manifest.counts.lines_rendered, 9);
    assert_eq!(manifest.counts.words_rendered, 22);
    assert_eq!(manifest.counts.surah_titles_indexed, 2);
    assert_eq!(manifest.paths.template, "bundled");
}

#[test]
fn worker_count_does_not_change_output() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (layout_db, words_db) =
        write_sources(dir.path(), &three_page_layout(), &three_page_words());

    let mut sequential = pages_args(dir.path(), layout_db.clone(), words_db.clone(), 1);
    sequential.out_dir = dir.path().join("sequential");
    run(sequential).expect("sequential run should succeed");

    let mut parallel = pages_args(dir.path(), layout_db, words_db, 3);
    parallel.out_dir = dir.path().join("parallel");
    run(parallel).expect("parallel run should succeed");

    for name in ["001.html", "002.html", "003.html"] {
        let left = fs::read(dir.path().join("sequential").join(name)).expect("sequential page");
        let right = fs::read(dir.path().join("parallel").join(name)).expect("parallel page");
        assert_eq!(left, right, "{name} differs between worker counts");
    }
}

#[test]
fn failed_page_does_not_stop_its_siblings() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut layout = three_page_layout()
        .into_iter()
        .filter(|row| row.0 != 2)
        .collect::<Vec<LayoutRow>>();
    layout.push((2, 1, "sajdah_marker", 0, "", "", ""));
    let (layout_db, words_db) = write_sources(dir.path(), &layout, &three_page_words());
    let args = pages_args(dir.path(), layout_db, words_db, 2);

    let err = run(args).expect_err("a failed page should fail the run");
    assert!(err.to_string().contains("1 of 3 pages"), "unexpected error: {err}");

    let out_dir = dir.path().join("pages");
    assert!(out_dir.join("001.html").is_file());
    assert!(!out_dir.join("002.html").exists());
    assert!(out_dir.join("003.html").is_file());

    let manifest = read_manifest(&dir.path().join("run.json"));
    assert_eq!(manifest.status, "completed_with_failures");
    assert_eq!(manifest.failures.len(), 1);
    assert_eq!(manifest.failures[0].page, 2);
    assert_eq!(manifest.failures[0].line, Some(1));
    assert!(manifest.failures[0].error.contains("sajdah_marker"));
}

#[test]
fn corrupted_template_aborts_before_writing_pages() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (layout_db, words_db) =
        write_sources(dir.path(), &three_page_layout(), &three_page_words());
    let template_path = dir.path().join("broken.html");
    fs::write(&template_path, "<html><head></head><body></body></html>")
        .expect("template should be written");

    let mut args = pages_args(dir.path(), layout_db, words_db, 1);
    args.template_path = Some(template_path);

    let err = run(args).expect_err("corrupted template must abort");
    let chain = format!("{err:#}");
    assert!(chain.contains("page-root"), "unexpected error: {chain}");
    assert!(!dir.path().join("pages").join("001.html").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let (layout_db, words_db) =
        write_sources(dir.path(), &three_page_layout(), &three_page_words());
    let mut args = pages_args(dir.path(), layout_db, words_db, 1);
    args.dry_run = true;

    run(args).expect("dry run should succeed");
    assert!(!dir.path().join("pages").exists());
    assert!(!dir.path().join("run.json").exists());
}

#[test]
fn page_range_is_validated() {
    assert!(validate_page_range(1, 604).is_ok());
    assert!(validate_page_range(0, 3).is_err());
    assert!(validate_page_range(1, 605).is_err());
    assert!(validate_page_range(9, 3).is_err());
}
