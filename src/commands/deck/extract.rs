use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::layout::{FIRST_PAGE, LAST_PAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PageFile {
    pub page: u16,
    pub path: PathBuf,
}

/// Composed page files in page order. Files whose stem is not a page number
/// in range are ignored.
pub(super) fn discover_pages(pages_dir: &Path) -> Result<Vec<PageFile>> {
    let mut pages = Vec::<PageFile>::new();
    for path in list_with_extension(pages_dir, "html")? {
        let page = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u16>().ok())
            .filter(|page| (FIRST_PAGE..=LAST_PAGE).contains(page));
        if let Some(page) = page {
            pages.push(PageFile { page, path });
        }
    }

    pages.sort_by_key(|page| page.page);
    Ok(pages)
}

pub(super) fn discover_fonts(pages_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut fonts = list_with_extension(pages_dir, "ttf")?;
    fonts.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(fonts)
}

fn list_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    let mut paths = Vec::<PathBuf>::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Pulls the card markup out of a composed page: navigation buttons and the
/// first script are dropped, every style element is kept, and the body's
/// inner markup follows them.
pub(super) struct CardExtractor {
    nav_button: Regex,
    script: Regex,
    style: Regex,
    body: Regex,
}

impl CardExtractor {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            nav_button: Regex::new(
                r#"(?is)<button\b[^>]*\bid\s*=\s*["'](?:prevPage|nextPage)["'][^>]*>.*?</button\s*>"#,
            )
            .context("invalid navigation button pattern")?,
            script: Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")
                .context("invalid script pattern")?,
            style: Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>")
                .context("invalid style pattern")?,
            body: Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>")
                .context("invalid body pattern")?,
        })
    }

    /// `None` when the page has no body.
    pub(super) fn card_html(&self, page_html: &str) -> Option<String> {
        let without_nav = self.nav_button.replace_all(page_html, "");
        let cleaned = self.script.replacen(&without_nav, 1, "");

        let styles = self
            .style
            .find_iter(&cleaned)
            .map(|found| found.as_str())
            .collect::<Vec<&str>>()
            .join("\n");

        let body = self.body.captures(&cleaned)?.get(1)?.as_str().trim();

        Some(format!("{styles} {body}"))
    }
}

/// Appends `hook` to the template script, just before its closing tag.
/// Without a template script the hook gets a script element of its own.
pub(super) fn script_with_hook(script: Option<&str>, hook: &str) -> String {
    match script.and_then(|script| script.rfind("</script").map(|at| (script, at))) {
        Some((script, at)) => format!("{}{hook}\n{}", &script[..at], &script[at..]),
        None => format!("<script>\n{hook}\n</script>"),
    }
}
