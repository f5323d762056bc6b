mod classify;
mod crawl;
mod extract;
mod link;
mod normalize;
mod render;
mod settings;
mod translations;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crawl::fetch::{HttpFetcher, Jitter};
use crawl::{Checkpoint, CrawlOptions};
use link::LinkInjector;
use render::Renderer;
use settings::Settings;
use translations::{write_atomic, TranslationMap};

#[derive(Parser)]
#[command(name = "asl_lexicon", about = "Harvest ASL font examples into a categorized dictionary page")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the font site and write the translations JSON
    Fetch {
        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Render the translations JSON into the dictionary page
    Render,
    /// Fetch + render in one go
    Run {
        #[command(flatten)]
        budget: BudgetArgs,
    },
}

#[derive(clap::Args)]
struct BudgetArgs {
    /// Bounded test run (stops after the configured test budget, 20 by default)
    #[arg(long)]
    test: bool,
    /// Max pages to fetch (overrides --test)
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

impl BudgetArgs {
    fn budget(&self, settings: &Settings) -> Option<usize> {
        self.limit.or(self.test.then_some(settings.test_budget))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "Settings loaded");

    match cli.command {
        Commands::Fetch { budget } => fetch(&settings, budget.budget(&settings))?,
        Commands::Render => render(&settings)?,
        Commands::Run { budget } => {
            fetch(&settings, budget.budget(&settings))?;
            render(&settings)?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn fetch(settings: &Settings, budget: Option<usize>) -> Result<()> {
    let mut fetcher =
        HttpFetcher::new(settings.timeout_secs).context("Failed to build HTTP client")?;
    let opts = CrawlOptions {
        base_url: settings.base_url.clone(),
        budget,
        jitter: Jitter::new(settings.delay_min, settings.delay_max),
        normalize_meanings: settings.normalize_meanings,
        checkpoint: (settings.checkpoint_every > 0).then(|| Checkpoint {
            every: settings.checkpoint_every,
            path: settings.translations_path.clone(),
        }),
    };

    match budget {
        Some(n) => println!("Crawling {} (at most {} pages)...", settings.base_url, n),
        None => println!("Crawling {}...", settings.base_url),
    }
    let (map, report) = crawl::crawl(&mut fetcher, &opts);
    report.print(&map);

    map.save(&settings.translations_path)?;
    println!("Wrote {:?}", settings.translations_path);
    Ok(())
}

fn render(settings: &Settings) -> Result<()> {
    let map = TranslationMap::load(&settings.translations_path)?;
    let template = std::fs::read_to_string(&settings.template_path)
        .with_context(|| format!("Failed to read template {:?}", settings.template_path))?;

    let categories = classify::categorize(&map);
    for category in classify::Category::ALL {
        println!("  {:<24} {:>5} entries", category.title(), categories.get(category).len());
    }
    info!("{} pairs across {} meanings", categories.pair_count(), map.len());

    let links = LinkInjector::new(&settings.dictionary_url)?;
    let renderer = Renderer::new(links, settings.section_id.clone());
    let doc = renderer.render_document(&template, categories)?;

    write_atomic(&settings.output_path, doc.as_bytes())?;
    println!("Wrote {:?}", settings.output_path);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
