mod logging;
mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use engine_logging::engine_info;
use feed_engine::{FeedEngine, RenderOutcome, RenderedPage, RequestEnv};

use crate::logging::LogDestination;

#[derive(Parser)]
#[command(
    name = "feed",
    about = "Render one page of a card feed from a state token",
    long_about = None
)]
struct Cli {
    /// Feed configuration (RON)
    #[arg(short, long, default_value = "config/feed.ron")]
    config: PathBuf,

    /// Directory holding one subdirectory per card type
    #[arg(short, long, default_value = ".")]
    data_root: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Print debug logging
    #[arg(short, long)]
    verbose: bool,

    /// State token from the previous page; empty for a fresh feed
    #[arg(default_value = "")]
    token: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, logging::level_for(cli.verbose));

    let config = settings::load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let engine = FeedEngine::new(config, &cli.data_root);

    match engine.render(&cli.token, &RequestEnv::new()) {
        RenderOutcome::Page(page) => {
            engine_info!("{}", summary(&page));
            let json = serde_json::to_string_pretty(&page.view())
                .context("serializing the page")?;
            println!("{json}");
            Ok(())
        }
        RenderOutcome::Unauthorized { headers } => {
            bail!("request was not authorized ({} header(s))", headers.len())
        }
    }
}

/// One-line description of a rendered page. Counts only the cards this
/// response renders, not the placeholders for earlier pages.
fn summary(page: &RenderedPage) -> String {
    let cards = page
        .page
        .fresh_cards()
        .iter()
        .filter(|c| !c.is_heading())
        .count();
    format!(
        "rendered {:?} page with {cards} card(s), next token {:?}",
        page.mode, page.next_token
    )
}
