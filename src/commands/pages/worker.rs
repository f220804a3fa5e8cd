use super::*;

const PROGRESS_EVERY: usize = 50;

pub(super) struct WorkerSettings<'a> {
    pub(super) layout_db: &'a Path,
    pub(super) words_db: &'a Path,
    pub(super) out_dir: &'a Path,
    pub(super) dry_run: bool,
}

#[derive(Debug, Clone)]
pub(super) struct PageSummary {
    pub(super) page: u16,
    pub(super) lines: usize,
    pub(super) words: usize,
}

#[derive(Debug, Clone)]
pub(super) enum PageOutcome {
    Written(PageSummary),
    Failed(PageFailure),
}

impl PageOutcome {
    pub(super) fn page(&self) -> u16 {
        match self {
            Self::Written(summary) => summary.page,
            Self::Failed(failure) => failure.page,
        }
    }
}

/// Composes `pages`, splitting them into one contiguous range per worker.
/// Outcomes come back in page order whatever the worker count.
pub(super) fn compose_pages(
    settings: &WorkerSettings<'_>,
    pages: &[u16],
    template: &PageTemplate,
    surahs: &SurahIndex,
    jobs: usize,
) -> Result<Vec<PageOutcome>> {
    let progress = AtomicUsize::new(0);
    let jobs = jobs.clamp(1, pages.len().max(1));

    let mut outcomes = if jobs == 1 {
        compose_range(settings, pages, template, surahs, &progress, pages.len())?
    } else {
        let chunk_size = pages.len().div_ceil(jobs);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build page worker pool")?;

        let batches = pool.install(|| {
            pages
                .par_chunks(chunk_size)
                .map(|chunk| compose_range(settings, chunk, template, surahs, &progress, pages.len()))
                .collect::<Result<Vec<Vec<PageOutcome>>>>()
        })?;
        batches.into_iter().flatten().collect::<Vec<PageOutcome>>()
    };

    outcomes.sort_by_key(PageOutcome::page);
    Ok(outcomes)
}

/// One worker: its own read-only connections, one page range.
fn compose_range(
    settings: &WorkerSettings<'_>,
    pages: &[u16],
    template: &PageTemplate,
    surahs: &SurahIndex,
    progress: &AtomicUsize,
    total: usize,
) -> Result<Vec<PageOutcome>> {
    let layout = SqliteLayout::open(settings.layout_db)?;
    let words = SqliteWords::open(settings.words_db)?;
    let composer = PageComposer::new(&layout, &words, template, surahs);

    let mut outcomes = Vec::with_capacity(pages.len());
    for &page in pages {
        let outcome = match composer.compose(page) {
            Ok(composed) => {
                if !settings.dry_run {
                    let path = settings.out_dir.join(&composed.file_name);
                    write_bytes(&path, composed.markup.as_bytes())?;
                }
                PageOutcome::Written(PageSummary {
                    page,
                    lines: composed.line_count,
                    words: composed.word_count,
                })
            }
            Err(err) if err.is_run_fatal() => {
                return Err(anyhow::Error::new(err)
                    .context(format!("page {page}: template unusable, aborting run")));
            }
            Err(err) => {
                warn!(
                    page,
                    line = ?err.line_number(),
                    error = %err,
                    "page composition failed"
                );
                PageOutcome::Failed(failure_for(page, &err))
            }
        };
        outcomes.push(outcome);

        let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_EVERY == 0 || done == total {
            info!(done, total, "pages composed");
        }
    }

    Ok(outcomes)
}

fn failure_for(page: u16, err: &ComposeError) -> PageFailure {
    let mut message = err.to_string();
    if let ComposeError::Store(source) = err {
        message = format!("{message}: {source}");
    }

    PageFailure {
        page,
        line: err.line_number(),
        error: message,
    }
}
