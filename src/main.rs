use std::fs;
use std::path::Path;

use clap::Parser;

use saham::cli::{Cli, Commands};
use saham::config::Config;
use saham::domain::{AliasTable, Article, KeywordSet};
use saham::errors::{SahamError, SahamResult};
use saham::extract::ContentExtractor;
use saham::ownership;
use saham::services::{NewsOptions, NewsService};
use saham::sources::{catalog, FeedFetcher, GoogleNewsSource, NewsSource, SourceOutcome, SourceReport};
use saham::storage::sqlite::{SqliteArticleCacheRepository, SqliteStorage};
use saham::storage::ArticleCacheRepository;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> SahamResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::News {
            code,
            refresh,
            max_age,
            keywords,
            sources,
            limit,
            content,
            json,
        } => cmd_news(
            &config, &code, refresh, max_age, &keywords, &sources, limit, content, json,
        ),
        Commands::Cached { code, limit, json } => cmd_cached(&config, &code, limit, json),
        Commands::Sources { opml, output } => cmd_sources(opml, output),
        Commands::Ownership {
            code,
            data_dir,
            json,
        } => cmd_ownership(&config, &code, data_dir, json),
    }
}

fn cmd_news(
    config: &Config,
    code: &str,
    refresh: bool,
    max_age: Option<i64>,
    extra_keywords: &[String],
    source_labels: &[String],
    limit: Option<usize>,
    with_content: bool,
    json: bool,
) -> SahamResult<()> {
    let code = normalize_code(code)?;

    // Initialize storage
    let storage = SqliteStorage::new(&config.db_path)?;
    let cache_repo = SqliteArticleCacheRepository::new(storage);

    // A missing alias file degrades to searching by code alone
    let aliases = match AliasTable::load(&config.alias_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Warning: {}; searching by code only", e);
            AliasTable::default()
        }
    };
    let keyword_set = KeywordSet::build(&code, aliases.get(&code), extra_keywords);

    let feed_sources = if source_labels.is_empty() {
        catalog::default_sources(config.http_timeout)
    } else {
        catalog::select_sources(source_labels, config.http_timeout)?
    };
    let fallback = GoogleNewsSource::new(keyword_set.joined(), config.http_timeout);

    let fetcher = FeedFetcher::new(config.fetch_retries, config.retry_delay);
    let service = NewsService::new(cache_repo, fetcher);
    let options = NewsOptions {
        refresh,
        max_age_hours: max_age.unwrap_or(config.max_age_hours),
        limit,
    };

    let mut report = service.news(
        &code,
        &keyword_set,
        &feed_sources,
        Some(&fallback as &dyn NewsSource),
        &options,
    )?;

    if with_content {
        let extractor = ContentExtractor::new(config.reader_mode, config.http_timeout);
        let filled = service.attach_content(
            &code,
            &report.keyword_string,
            &mut report.articles,
            &extractor,
        )?;
        if !json && filled > 0 {
            println!("Downloaded article content for {} entries.\n", filled);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report.articles)?);
        return Ok(());
    }

    println!("News for {} (keywords: {})\n", code, report.keyword_string);

    print_source_reports(&report.sources);

    if report.from_cache {
        if report.stale {
            println!("Sources returned nothing usable; serving stale cached articles.\n");
        } else {
            println!("Serving {} cached articles.\n", report.articles.len());
        }
    } else if report.fallback_used {
        println!("No feed entries matched; fell back to Google News search.\n");
    }

    if report.articles.is_empty() {
        println!("No news found for {}.", code);
        return Ok(());
    }

    print_articles(&report.articles, with_content);

    Ok(())
}

fn cmd_cached(config: &Config, code: &str, limit: usize, json: bool) -> SahamResult<()> {
    let code = normalize_code(code)?;

    let storage = SqliteStorage::new(&config.db_path)?;
    let cache_repo = SqliteArticleCacheRepository::new(storage);
    let articles = cache_repo.recent(&code, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    if articles.is_empty() {
        println!("No cached articles for {}.", code);
        return Ok(());
    }

    println!("Cached articles for {}:\n", code);
    print_articles(&articles, false);

    Ok(())
}

fn cmd_sources(opml: bool, output: Option<String>) -> SahamResult<()> {
    if opml {
        let document = catalog::catalog_opml()?;
        match output {
            Some(path) => {
                fs::write(&path, &document)?;
                println!("Exported source catalog to {}", path);
            }
            None => println!("{}", document),
        }
        return Ok(());
    }

    println!("Available sources:\n");
    for (label, url) in catalog::CATALOG {
        println!("  {}", label);
        println!("    {}", url);
        println!();
    }

    Ok(())
}

fn cmd_ownership(
    config: &Config,
    code: &str,
    data_dir: Option<String>,
    json: bool,
) -> SahamResult<()> {
    let code = normalize_code(code)?;
    let dir = data_dir.unwrap_or_else(|| config.data_dir.clone());

    let (rows, load_report) = ownership::load_dir(Path::new(&dir))?;

    for (name, reason) in &load_report.skipped_files {
        eprintln!("Warning: skipped {}: {}", name, reason);
    }
    if load_report.skipped_rows > 0 {
        eprintln!(
            "Warning: dropped {} rows with an unreadable date or code",
            load_report.skipped_rows
        );
    }

    let totals = ownership::monthly_totals(&rows, &code);
    if totals.is_empty() {
        return Err(SahamError::NoOwnershipData(code));
    }
    let breakdown = ownership::category_breakdown(&rows, &code);

    if json {
        let payload = serde_json::json!({
            "code": code,
            "monthly": totals,
            "breakdown": breakdown,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "Ownership for {} ({} files, {} rows):\n",
        code, load_report.files, load_report.rows
    );

    println!(
        "{:<10} {:>20} {:>20} {:>20}",
        "Month", "Local", "Foreign", "Total"
    );
    for month in &totals {
        println!(
            "{:<10} {:>20} {:>20} {:>20}",
            month.month,
            ownership::format_amount(month.local),
            ownership::format_amount(month.foreign),
            ownership::format_amount(month.total())
        );
    }

    if let Some(breakdown) = breakdown {
        println!("\nComposition for {}:\n", breakdown.month);
        println!(
            "{:<8} {:<42} {:>18} {:>8} {:>15}",
            "Side", "Category", "Shares", "Share", "Change"
        );
        for share in &breakdown.shares {
            println!(
                "{:<8} {:<42} {:>18} {:>7.2}% {:>15}",
                share.side.to_string(),
                share.category,
                ownership::format_amount(share.amount),
                share.share,
                format_delta(share.delta)
            );
        }
    }

    Ok(())
}

fn normalize_code(code: &str) -> SahamResult<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(SahamError::InvalidInput(
            "stock code must not be empty".to_string(),
        ));
    }
    Ok(code)
}

fn print_source_reports(reports: &[SourceReport]) {
    if reports.is_empty() {
        return;
    }

    println!("Sources:");
    for report in reports {
        match &report.outcome {
            SourceOutcome::Fetched(count) => {
                println!("  {} ({} entries)", report.label, count);
            }
            SourceOutcome::Skipped(error) => {
                println!("  {} skipped: {}", report.label, error);
            }
        }
    }
    println!();
}

fn print_articles(articles: &[Article], show_content: bool) {
    for (i, article) in articles.iter().enumerate() {
        println!("{}. {}", i + 1, article.title);
        match article.published {
            Some(when) => println!("   {} | {}", article.source, when.format("%Y-%m-%d %H:%M")),
            None => println!("   {}", article.source),
        }
        println!("   {}", article.link);
        if !article.summary.is_empty() {
            println!("   {}", article.summary);
        }
        if show_content {
            if let Some(content) = article.content.as_deref().filter(|c| !c.is_empty()) {
                println!();
                println!("   {}", content);
            }
        }
        println!();
    }
}

fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{}", ownership::format_amount(delta))
    } else if delta < 0.0 {
        ownership::format_amount(delta)
    } else {
        "0".to_string()
    }
}
