use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "mushaf-deck",
    version,
    about = "Rebuild mushaf pages from layout databases and package them as a flashcard deck"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose one HTML document per page.
    Pages(PagesArgs),
    /// Package composed pages into an .apkg deck.
    Deck(DeckArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PagesArgs {
    #[arg(long, default_value = "QPC v4 tajweed.sqlite")]
    pub layout_db: PathBuf,

    #[arg(long, default_value = "QPC V4.sqlite")]
    pub words_db: PathBuf,

    /// HTML skeleton with an empty `<div id="page">`; the bundled one is used when absent.
    #[arg(long)]
    pub template_path: Option<PathBuf>,

    #[arg(long, default_value = "pages")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub first_page: u16,

    #[arg(long, default_value_t = 604)]
    pub last_page: u16,

    #[arg(long, default_value_t = 20)]
    pub jobs: usize,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeckArgs {
    #[arg(long, default_value = "pages")]
    pub pages_dir: PathBuf,

    #[arg(long)]
    pub template_path: Option<PathBuf>,

    /// Card stylesheet; defaults to `style.css` inside the pages directory.
    #[arg(long)]
    pub css_path: Option<PathBuf>,

    #[arg(long, default_value = "output.apkg")]
    pub output: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 1871019098)]
    pub model_id: i64,

    #[arg(long, default_value = "Quran Pages")]
    pub model_name: String,

    #[arg(long, default_value_t = 2059400140)]
    pub deck_id: i64,

    #[arg(long, default_value = "Quran_anki")]
    pub deck_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "QPC v4 tajweed.sqlite")]
    pub layout_db: PathBuf,

    #[arg(long, default_value = "QPC V4.sqlite")]
    pub words_db: PathBuf,

    #[arg(long, default_value = "pages")]
    pub out_dir: PathBuf,
}
