use super::*;

const BUNDLED_STYLESHEET: &str = include_str!("../../../assets/style.css");

pub fn run(args: PagesArgs) -> Result<()> {
    validate_page_range(args.first_page, args.last_page)?;

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("pages-{}", utc_compact_string(started_ts));

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.out_dir.join("manifests").join(format!(
            "pages_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        run_id = %run_id,
        first_page = args.first_page,
        last_page = args.last_page,
        jobs = args.jobs,
        "starting page composition"
    );

    let template = load_template(args.template_path.as_deref())?;

    let titles = SqliteLayout::open(&args.layout_db)?
        .fetch_section_titles()
        .with_context(|| format!("failed to index surah titles in {}", args.layout_db.display()))?;
    let surahs = SurahIndex::build(&titles, LAST_PAGE);
    info!(titles = surahs.titles_indexed(), "built surah index");

    if !args.dry_run {
        ensure_directory(&args.out_dir)?;
    }

    let pages = (args.first_page..=args.last_page).collect::<Vec<u16>>();
    let settings = WorkerSettings {
        layout_db: &args.layout_db,
        words_db: &args.words_db,
        out_dir: &args.out_dir,
        dry_run: args.dry_run,
    };
    let outcomes = compose_pages(&settings, &pages, &template, &surahs, args.jobs)?;

    let mut warnings = Vec::<String>::new();
    if !args.dry_run {
        if let Some(warning) = write_stylesheet_if_missing(&args.out_dir)? {
            warnings.push(warning);
        }
    }

    let mut counts = PagesRunCounts {
        pages_requested: pages.len(),
        pages_written: 0,
        pages_failed: 0,
        lines_rendered: 0,
        words_rendered: 0,
        surah_titles_indexed: surahs.titles_indexed(),
    };
    let mut failures = Vec::<PageFailure>::new();
    for outcome in outcomes {
        match outcome {
            PageOutcome::Written(summary) => {
                counts.pages_written += 1;
                counts.lines_rendered += summary.lines;
                counts.words_rendered += summary.words;
            }
            PageOutcome::Failed(failure) => {
                counts.pages_failed += 1;
                failures.push(failure);
            }
        }
    }

    let status = if failures.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };

    if args.dry_run {
        info!(
            pages = counts.pages_written,
            failed = counts.pages_failed,
            "page composition dry-run complete"
        );
    } else {
        let manifest = PagesRunManifest {
            manifest_version: 1,
            run_id,
            status: status.to_string(),
            started_at,
            updated_at: now_utc_string(),
            first_page: args.first_page,
            last_page: args.last_page,
            jobs: args.jobs,
            paths: PagesRunPaths {
                layout_db: args.layout_db.display().to_string(),
                words_db: args.words_db.display().to_string(),
                template: args
                    .template_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "bundled".to_string()),
                out_dir: args.out_dir.display().to_string(),
            },
            counts: counts.clone(),
            failures: failures.clone(),
            warnings,
        };
        write_json_pretty(&manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote pages run manifest");
        info!(
            pages = counts.pages_written,
            lines = counts.lines_rendered,
            words = counts.words_rendered,
            "page composition completed"
        );
    }

    if !failures.is_empty() {
        bail!(
            "{} of {} pages failed to compose (first failure: page {})",
            failures.len(),
            counts.pages_requested,
            failures[0].page
        );
    }

    Ok(())
}

pub(super) fn validate_page_range(first_page: u16, last_page: u16) -> Result<()> {
    if first_page < FIRST_PAGE || last_page > LAST_PAGE {
        bail!("page range {first_page}..={last_page} is outside {FIRST_PAGE}..={LAST_PAGE}");
    }
    if first_page > last_page {
        bail!("first page {first_page} is after last page {last_page}");
    }
    Ok(())
}

pub(crate) fn load_template(template_path: Option<&Path>) -> Result<PageTemplate> {
    let template = match template_path {
        Some(path) => PageTemplate::load(path)
            .with_context(|| format!("failed to load page template {}", path.display()))?,
        None => PageTemplate::bundled().context("bundled page template is unusable")?,
    };
    Ok(template)
}

fn write_stylesheet_if_missing(out_dir: &Path) -> Result<Option<String>> {
    let path: PathBuf = out_dir.join("style.css");
    if path.exists() {
        return Ok(None);
    }

    write_bytes(&path, BUNDLED_STYLESHEET.as_bytes())?;
    info!(path = %path.display(), "wrote bundled stylesheet");
    Ok(Some(format!(
        "no stylesheet in {}; wrote the bundled one",
        out_dir.display()
    )))
}
