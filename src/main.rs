//! Soccer odds scraper CLI
//!
//! Scrapes league results with bookmaker odds into a deduplicated dataset.

use clap::{Parser, Subcommand};
use soccer_odds::{Config, Result};

#[derive(Parser)]
#[command(name = "soccer-odds")]
#[command(about = "Soccer results and betting odds scraper", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Scrape the leagues described by the given JSON files
    Scrape {
        /// League files ({"league", "area", "urls"})
        #[arg(required = true)]
        leagues: Vec<String>,
        /// Start from an empty dataset instead of the kept one
        #[arg(long)]
        fresh: bool,
        /// Cache directory for HTML files
        #[arg(long)]
        cache: Option<String>,
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Parse one saved results page and print its records
    Parse {
        /// HTML file
        file: String,
        #[arg(long)]
        league: String,
        #[arg(long)]
        area: String,
        /// URL the page was saved from
        #[arg(long)]
        url: String,
        /// Markup variant, overrides the config
        #[arg(long)]
        markup: Option<String>,
    },
    /// Export the kept dataset
    Export {
        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show database status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use csv or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Scrape {
            leagues,
            fresh,
            cache,
            offline,
        } => commands::scrape(&config, &leagues, fresh, cache, offline),
        Commands::Parse {
            file,
            league,
            area,
            url,
            markup,
        } => commands::parse(&config, &file, &league, &area, &url, markup),
        Commands::Export { format, output } => commands::export(&config, format, output),
        Commands::Status => commands::status(&config),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

mod commands {
    use super::*;
    use soccer_odds::data::scrapers::{
        parse_page, HttpPageSource, LeagueScraper, MarkupKind, PageContext, RunSummary,
    };
    use soccer_odds::data::{AnomalyTable, Database, MatchDataset};
    use soccer_odds::LeagueDescriptor;
    use std::io::Write;

    /// Commands return `Ok(false)` when they finished but something failed
    /// along the way.
    type CommandResult = Result<bool>;

    pub fn init(config_path: &str) -> CommandResult {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Write a league file, e.g. bundesliga.json:");
        println!(
            r#"     {{"league": "Bundesliga", "area": "Germany", "urls": ["https://www.oddsportal.com/soccer/germany/bundesliga/results/"]}}"#
        );
        println!("  3. Run 'soccer-odds scrape bundesliga.json'");

        Ok(true)
    }

    pub fn scrape(
        config: &Config,
        league_files: &[String],
        fresh: bool,
        cache: Option<String>,
        offline: bool,
    ) -> CommandResult {
        let leagues = league_files
            .iter()
            .map(|path| LeagueDescriptor::load(path))
            .collect::<Result<Vec<_>>>()?;

        let mut dataset = load_kept_dataset(config, fresh)?;
        let kept = dataset.len();

        let mut source = HttpPageSource::new(&config.scrape)?;
        if let Some(cache_dir) = cache.or_else(|| config.data.cache_dir.clone()) {
            println!("Using cache directory: {}", cache_dir);
            source = source.with_cache(&cache_dir);
        }
        if offline {
            println!("Offline mode: using cached files only");
            source = source.offline_only(true);
        }

        let today = chrono::Local::now().date_naive();
        let scraper = LeagueScraper::new(config, &source, today)?;

        let mut summary = RunSummary::default();
        for league in &leagues {
            summary.merge(scraper.scrape_league(league, &mut dataset));
        }

        dataset.save_json(&config.data.dataset_path)?;
        let mut db = Database::open(&config.data.database_path)?;
        let stored = db.upsert_matches(dataset.all())?;

        println!("Scrape Summary");
        println!("───────────────────────────────");
        println!("  Pages:        {}", summary.pages);
        println!("  New records:  {}", summary.records);
        println!("  Kept before:  {}", kept);
        println!("  Dataset:      {} ({})", dataset.len(), config.data.dataset_path);
        println!("  No odds:      {}", summary.stats.odds_unavailable_skips);
        println!("  Unsupported:  {}", summary.stats.unsupported_date_skips);
        println!("  Corrected:    {}", summary.stats.anomalies_corrected);
        println!("  Stored:       {} ({})", stored, config.data.database_path);

        for failure in &summary.failures {
            eprintln!("Failed {}: {}", failure.url, failure.error);
        }
        Ok(summary.is_success())
    }

    fn load_kept_dataset(config: &Config, fresh: bool) -> Result<MatchDataset> {
        let path = std::path::Path::new(&config.data.dataset_path);
        if fresh || !path.exists() {
            return Ok(MatchDataset::new());
        }
        let dataset = MatchDataset::load_json(path)?;
        log::info!("Loaded {} kept records from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    pub fn parse(
        config: &Config,
        file: &str,
        league: &str,
        area: &str,
        url: &str,
        markup: Option<String>,
    ) -> CommandResult {
        let html = std::fs::read_to_string(file)?;
        let kind: MarkupKind = markup.as_deref().unwrap_or(&config.scrape.markup).parse()?;
        let markup = kind.build()?;
        let anomalies = AnomalyTable::from_entries(&config.anomalies)?;

        let context = PageContext {
            league,
            area,
            url,
            today: chrono::Local::now().date_naive(),
            anomalies: &anomalies,
        };
        let parsed = parse_page(markup.as_ref(), &html, &context)?;
        log::info!(
            "{}: {} records from {} match rows ({} without odds, {} unsupported)",
            file,
            parsed.stats.records,
            parsed.stats.match_rows,
            parsed.stats.odds_unavailable_skips,
            parsed.stats.unsupported_date_skips
        );

        println!("{}", serde_json::to_string_pretty(&parsed.records)?);
        Ok(true)
    }

    pub fn export(config: &Config, format: OutputFormat, output: Option<String>) -> CommandResult {
        let dataset = MatchDataset::load_json(&config.data.dataset_path)?;

        let mut out: Box<dyn Write> = match &output {
            Some(path) => Box::new(std::fs::File::create(path)?),
            None => Box::new(std::io::stdout().lock()),
        };
        match format {
            OutputFormat::Csv => dataset.write_csv(&mut out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut out, dataset.all())?;
                writeln!(out)?;
            }
        }
        out.flush()?;

        if let Some(path) = output {
            log::info!("Exported {} records to {}", dataset.len(), path);
        }
        Ok(true)
    }

    pub fn status(config: &Config) -> CommandResult {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Leagues:    {}", stats.league_count);
        println!("  Matches:    {}", stats.match_count);
        println!("  Unresolved: {}", stats.unresolved_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest_match, stats.latest_match) {
            println!("  Range:      {} to {}", earliest, latest);
        }

        Ok(true)
    }
}
