use std::io::Read;

use flate2::read::DeflateDecoder;
use rusqlite::Connection;

use super::run::build_collection;
use super::*;
use crate::cli::PagesArgs;
use crate::fixtures::{three_page_layout, three_page_words, write_sources};

fn u16_at(raw: &[u8], at: usize) -> usize {
    usize::from(u16::from_le_bytes([raw[at], raw[at + 1]]))
}

fn u32_at(raw: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]])
}

/// Entry name to `(method, bytes)`, checked against the stored CRC.
fn read_package(raw: &[u8]) -> BTreeMap<String, (usize, Vec<u8>)> {
    let eocd = raw.len() - 22;
    assert_eq!(u32_at(raw, eocd), 0x0605_4b50, "archive should end with a directory record");

    let count = u16_at(raw, eocd + 10);
    let mut cursor = u32_at(raw, eocd + 16) as usize;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        assert_eq!(u32_at(raw, cursor), 0x0201_4b50);
        let method = u16_at(raw, cursor + 10);
        let crc = u32_at(raw, cursor + 16);
        let compressed_len = u32_at(raw, cursor + 20) as usize;
        let name_len = u16_at(raw, cursor + 28);
        let local = u32_at(raw, cursor + 42) as usize;
        let name = String::from_utf8(raw[cursor + 46..cursor + 46 + name_len].to_vec())
            .expect("entry name should be UTF-8");

        assert_eq!(u32_at(raw, local), 0x0403_4b50);
        let data_start = local + 30 + u16_at(raw, local + 26) + u16_at(raw, local + 28);
        let stored = &raw[data_start..data_start + compressed_len];
        let data = if method == 8 {
            let mut inflated = Vec::new();
            DeflateDecoder::new(stored)
                .read_to_end(&mut inflated)
                .expect("entry should inflate");
            inflated
        } else {
            stored.to_vec()
        };
        assert_eq!(crc32fast::hash(&data), crc, "{name} CRC mismatch");

        entries.insert(name, (method, data));
        cursor += 46 + name_len + u16_at(raw, cursor + 30) + u16_at(raw, cursor + 32);
    }
    entries
}

fn compose_pages(dir: &Path) -> PathBuf {
    let (layout_db, words_db) =
        write_sources(dir, &three_page_layout(), &three_page_words());
    let pages_dir = dir.join("pages");
    crate::commands::pages::run(PagesArgs {
        layout_db,
        words_db,
        template_path: None,
        out_dir: pages_dir.clone(),
        first_page: 1,
        last_page: 3,
        jobs: 1,
        manifest_path: Some(dir.join("pages_run.json")),
        dry_run: false,
    })
    .expect("page run should succeed");
    pages_dir
}

fn deck_args(dir: &Path, pages_dir: PathBuf) -> DeckArgs {
    DeckArgs {
        pages_dir,
        template_path: None,
        css_path: None,
        output: dir.join("out").join("deck.apkg"),
        manifest_path: Some(dir.join("deck_run.json")),
        model_id: 1871019098,
        model_name: "Quran Pages".to_string(),
        deck_id: 2059400140,
        deck_name: "Quran_anki".to_string(),
    }
}

#[test]
fn guid_matches_reference_encoding() {
    assert_eq!(guid_for(&["001"]), "u1o/1}i1gJ");
    assert_eq!(guid_for(&["604"]), "kcm&[+InGa");
    assert_eq!(ids::base91_for_tests(90), "~");
    assert_eq!(ids::base91_for_tests(91), "ba");
}

#[test]
fn derived_ids_are_stable_positive_and_distinct() {
    let first = guid_for(&["001"]);
    let second = guid_for(&["002"]);

    assert_eq!(note_id_for(&first), note_id_for(&guid_for(&["001"])));
    assert_ne!(note_id_for(&first), note_id_for(&second));
    assert_ne!(note_id_for(&first), card_id_for(&first, 0));

    for id in [note_id_for(&first), card_id_for(&second, 0)] {
        assert!(id > 0 && id < 1 << 52, "id {id} out of range");
    }
}

#[test]
fn card_html_drops_navigation_and_first_script() {
    let page = r#"<html><head><style>.a{}</style></head><body>
<button id="prevPage">&lt;</button><div id="page"><span>w1</span></div><button id="nextPage">&gt;</button>
<script>function nextWord() {}</script>
</body></html>"#;

    let extractor = CardExtractor::new().expect("extractor should build");
    let html = extractor.card_html(page).expect("page has a body");

    assert!(html.starts_with("<style>.a{}</style> "), "unexpected html: {html}");
    assert!(html.contains(r#"<div id="page"><span>w1</span></div>"#));
    assert!(!html.contains("button"));
    assert!(!html.contains("<script"));
}

#[test]
fn page_without_body_is_not_a_card() {
    let extractor = CardExtractor::new().expect("extractor should build");
    assert_eq!(extractor.card_html("<div>orphan</div>"), None);
}

#[test]
fn hook_lands_inside_template_script() {
    let script = "<script>\nfunction nextWord() {}\n</script>";
    let hooked = script_with_hook(Some(script), "nextWord();");

    assert_eq!(hooked, "<script>\nfunction nextWord() {}\nnextWord();\n</script>");
    assert_eq!(script_with_hook(None, "go();"), "<script>\ngo();\n</script>");
}

#[test]
fn package_writer_deflates_only_when_it_helps() {
    let repetitive = "بسم ".repeat(500);
    let mut writer = PackageWriter::new(Vec::new());
    writer
        .add("big", repetitive.as_bytes())
        .expect("entry should be added");
    writer.add("tiny", b"x").expect("entry should be added");
    let raw = writer.finish().expect("package should finish");

    let entries = read_package(&raw);
    assert_eq!(entries["big"], (8, repetitive.into_bytes()));
    assert_eq!(entries["tiny"], (0, b"x".to_vec()));
}

#[test]
fn deck_run_packages_every_page_with_fonts() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let pages_dir = compose_pages(dir.path());
    fs::write(pages_dir.join("_p1.ttf"), b"font-one").expect("font should be written");
    fs::write(pages_dir.join("_p2.ttf"), b"font-two").expect("font should be written");

    run(deck_args(dir.path(), pages_dir)).expect("deck run should succeed");

    let raw = fs::read(dir.path().join("out").join("deck.apkg")).expect("package should exist");
    let entries = read_package(&raw);
    assert_eq!(entries["1"].1, b"font-two");

    let media: BTreeMap<String, String> =
        serde_json::from_slice(&entries["media"].1).expect("media map should parse");
    assert_eq!(media["0"], "_p1.ttf");
    assert_eq!(media["1"], "_p2.ttf");

    let collection_path = dir.path().join("collection.anki2");
    fs::write(&collection_path, &entries["collection.anki2"].1)
        .expect("collection should be extracted");
    let connection = Connection::open(&collection_path).expect("collection should open");

    let notes = connection
        .prepare("SELECT guid, flds, CAST(sfld AS TEXT) FROM notes ORDER BY sfld")
        .expect("notes query should prepare")
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .expect("notes query should run")
        .collect::<rusqlite::Result<Vec<(String, String, String)>>>()
        .expect("notes should decode");
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].0, "u1o/1}i1gJ");
    assert_eq!(notes[0].2, "1", "numeric sort field is stored as an integer");
    assert!(notes[0].1.starts_with("001\x1f"));
    let (page_num, html) = notes[0].1.split_once('\x1f').expect("two fields");
    assert_eq!(page_num, "001");
    assert!(html.contains("<style"));
    assert!(html.contains(r#"id="page""#));
    assert!(!html.contains("function nextWord"));

    let dues = connection
        .prepare("SELECT due FROM cards ORDER BY due")
        .expect("cards query should prepare")
        .query_map([], |row| row.get::<_, i64>(0))
        .expect("cards query should run")
        .collect::<rusqlite::Result<Vec<i64>>>()
        .expect("cards should decode");
    assert_eq!(dues, vec![1, 2, 3]);

    let models: String = connection
        .query_row("SELECT models FROM col", [], |row| row.get(0))
        .expect("collection row should exist");
    let models: serde_json::Value = serde_json::from_str(&models).expect("models should parse");
    let model = &models["1871019098"];
    assert_eq!(model["name"], "Quran Pages");
    assert_eq!(model["flds"][1]["name"], FIELD_NAMES[1]);
    let front = model["tmpls"][0]["qfmt"].as_str().expect("front template");
    assert!(front.starts_with("{{Html}}\n<script>"));
    assert!(front.contains("nextWord(); });\n</script>"));
    let back = model["tmpls"][0]["afmt"].as_str().expect("back template");
    assert!(back.contains("toggleAll(); });"));
    assert!(model["css"].as_str().expect("css").starts_with('\n'));

    let manifest: DeckRunManifest = serde_json::from_slice(
        &fs::read(dir.path().join("deck_run.json")).expect("manifest should be written"),
    )
    .expect("manifest should parse");
    assert_eq!(manifest.note_count, 3);
    assert_eq!(manifest.media_count, 2);
    assert!(!manifest.notes[2].font_bundled);
    assert_eq!(manifest.warnings.len(), 1);
    assert!(manifest.warnings[0].contains("_p3.ttf"));
    assert!(!dir.path().join("out").join("deck.anki2.tmp").exists());
}

#[test]
fn repackaging_keeps_note_identity() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let pages_dir = compose_pages(dir.path());

    let mut first = deck_args(dir.path(), pages_dir.clone());
    first.manifest_path = Some(dir.path().join("first.json"));
    run(first).expect("first deck run should succeed");

    let mut second = deck_args(dir.path(), pages_dir);
    second.manifest_path = Some(dir.path().join("second.json"));
    run(second).expect("second deck run should succeed");

    let read = |name: &str| -> DeckRunManifest {
        serde_json::from_slice(&fs::read(dir.path().join(name)).expect("manifest should exist"))
            .expect("manifest should parse")
    };
    let identities = |manifest: DeckRunManifest| {
        manifest
            .notes
            .into_iter()
            .map(|note| (note.page_num, note.guid, note.note_id))
            .collect::<Vec<_>>()
    };
    assert_eq!(identities(read("first.json")), identities(read("second.json")));
}

#[test]
fn empty_pages_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let pages_dir = dir.path().join("pages");
    fs::create_dir_all(&pages_dir).expect("pages dir should be created");
    fs::write(pages_dir.join("style.css"), "body {}").expect("css should be written");
    fs::write(pages_dir.join("notes.html"), "<body></body>").expect("stray file");

    let err = run(deck_args(dir.path(), pages_dir)).expect_err("no pages must fail");
    assert!(err.to_string().contains("no page files"), "unexpected error: {err}");
}

#[test]
fn failed_collection_build_leaves_no_scratch_file() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let output = dir.path().join("deck.apkg");
    let model = DeckModel {
        model_id: 1,
        model_name: "Model".to_string(),
        deck_id: 2,
        deck_name: "Deck".to_string(),
        css: String::new(),
        front_template: "{{Html}}".to_string(),
        back_template: "{{Html}}".to_string(),
    };
    let note = NoteRow {
        guid: guid_for(&["001"]),
        note_id: 7,
        card_id: 8,
        fields: ["001".to_string(), "<p>x</p>".to_string()],
    };
    let duplicate = NoteRow {
        guid: guid_for(&["002"]),
        card_id: 9,
        ..note.clone()
    };

    let err = build_collection(&output, &model, &[note, duplicate], 0)
        .expect_err("duplicate note ids must fail");
    assert!(format!("{err:#}").contains("failed to insert note"), "unexpected error: {err:#}");
    assert!(!dir.path().join("deck.anki2.tmp").exists());
    assert!(!dir.path().join("deck.anki2.tmp-journal").exists());
}
