use super::*;

const FRONT_HOOK: &str = "document.addEventListener('DOMContentLoaded', function () { for (let i = 0; i < 4; i++) nextWord(); });";
const BACK_HOOK: &str = "document.addEventListener('DOMContentLoaded', function () { toggleAll(); });";

pub fn run(args: DeckArgs) -> Result<()> {
    let started_ts = Utc::now();
    let run_id = format!("deck-{}", utc_compact_string(started_ts));

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.pages_dir.join("manifests").join(format!(
            "deck_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        run_id = %run_id,
        pages_dir = %args.pages_dir.display(),
        output = %args.output.display(),
        "starting deck packaging"
    );

    let template = load_template(args.template_path.as_deref())?;
    let css_path = args
        .css_path
        .clone()
        .unwrap_or_else(|| args.pages_dir.join("style.css"));
    let css = read_text(&css_path).context("card stylesheet is required")?;

    let model = DeckModel {
        model_id: args.model_id,
        model_name: args.model_name.clone(),
        deck_id: args.deck_id,
        deck_name: args.deck_name.clone(),
        css: format!("\n{css}"),
        front_template: format!("{{{{Html}}}}\n{}", script_with_hook(template.script(), FRONT_HOOK)),
        back_template: format!("{{{{Html}}}}\n{}", script_with_hook(template.script(), BACK_HOOK)),
    };

    let pages = discover_pages(&args.pages_dir)?;
    if pages.is_empty() {
        bail!("no page files found in {}", args.pages_dir.display());
    }
    let fonts = discover_fonts(&args.pages_dir)?;
    let font_names = fonts
        .iter()
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .map(str::to_string)
        .collect::<HashSet<String>>();

    let extractor = CardExtractor::new()?;
    let mut warnings = Vec::<String>::new();
    let mut notes = Vec::<NoteRow>::new();
    let mut entries = Vec::<DeckNoteEntry>::new();

    for page in &pages {
        let page_html = read_text(&page.path)?;
        let Some(card_html) = extractor.card_html(&page_html) else {
            warn!(page = page.page, path = %page.path.display(), "page file has no body; skipping");
            warnings.push(format!("{} has no body and was skipped", page.path.display()));
            continue;
        };

        let page_num = format!("{:03}", page.page);
        let guid = guid_for(&[&page_num]);
        let note_id = note_id_for(&guid);
        let font_bundled = font_names.contains(&font_file_name(page.page));
        if !font_bundled {
            warn!(page = page.page, font = %font_file_name(page.page), "page font is not bundled");
            warnings.push(format!(
                "page {page_num}: font {} not found in {}",
                font_file_name(page.page),
                args.pages_dir.display()
            ));
        }

        entries.push(DeckNoteEntry {
            page_num: page_num.clone(),
            guid: guid.clone(),
            note_id,
            font_bundled,
        });
        notes.push(NoteRow {
            card_id: card_id_for(&guid, 0),
            guid,
            note_id,
            fields: [page_num, card_html],
        });
    }

    if notes.is_empty() {
        bail!("none of the {} page files could be packaged", pages.len());
    }

    let collection = build_collection(&args.output, &model, &notes, started_ts.timestamp())?;
    let media = fonts
        .iter()
        .enumerate()
        .map(|(index, path)| (index, path.as_path()))
        .collect::<Vec<(usize, &Path)>>();
    write_package(&args.output, &collection, &media)?;

    let package_bytes =
        fs::read(&args.output).with_context(|| format!("failed to read {}", args.output.display()))?;

    let manifest = DeckRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: now_utc_string(),
        package_path: args.output.display().to_string(),
        package_sha256: sha256_hex(&package_bytes),
        deck_id: args.deck_id,
        deck_name: args.deck_name.clone(),
        model_id: args.model_id,
        model_name: args.model_name.clone(),
        note_count: notes.len(),
        media_count: fonts.len(),
        notes: entries,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote deck run manifest");
    info!(
        notes = manifest.note_count,
        media = manifest.media_count,
        package = %args.output.display(),
        "deck packaging completed"
    );

    Ok(())
}

/// Builds the collection database next to the package and returns its bytes.
/// The scratch file is removed whether or not the build succeeds.
pub(super) fn build_collection(
    output: &Path,
    model: &DeckModel,
    notes: &[NoteRow],
    now_secs: i64,
) -> Result<Vec<u8>> {
    let scratch: PathBuf = output.with_extension("anki2.tmp");
    if let Some(parent) = scratch.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let bytes = write_collection(&scratch, model, notes, now_secs).and_then(|()| {
        fs::read(&scratch)
            .with_context(|| format!("failed to read collection {}", scratch.display()))
    });
    let cleanup = remove_scratch(&scratch);

    let bytes = bytes?;
    cleanup?;
    Ok(bytes)
}

fn remove_scratch(scratch: &Path) -> Result<()> {
    let mut journal = scratch.as_os_str().to_owned();
    journal.push("-journal");

    for path in [scratch.to_path_buf(), PathBuf::from(journal)] {
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

fn write_package(output: &Path, collection: &[u8], media: &[(usize, &Path)]) -> Result<()> {
    let media_map = media
        .iter()
        .map(|(index, path)| {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("media file name is not UTF-8: {}", path.display()))?;
            Ok((index.to_string(), name.to_string()))
        })
        .collect::<Result<BTreeMap<String, String>>>()?;
    let media_json = serde_json::to_vec(&media_map).context("failed to serialize media map")?;

    let file = File::create(output)
        .with_context(|| format!("failed to create package {}", output.display()))?;
    let mut writer = PackageWriter::new(BufWriter::new(file));
    writer.add("collection.anki2", collection)?;
    writer.add("media", &media_json)?;
    for (index, path) in media {
        let data =
            fs::read(path).with_context(|| format!("failed to read media {}", path.display()))?;
        writer.add(&index.to_string(), &data)?;
    }
    writer.finish()?;

    Ok(())
}
