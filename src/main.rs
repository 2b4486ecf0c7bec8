// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Resolve the policy (settings file, then CLI flags, then geo lookup)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = nofollow findings, 2 = error)
//
// The rewriting itself lives in the library (src/lib.rs); this file is only
// the glue that feeds it files and prints results.
// =============================================================================

mod cli;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use tokio::io::AsyncReadExt;

use cli::{Cli, Commands, PolicyArgs};
use nofollow_guard::geo::GeoLookup;
use nofollow_guard::{
    transform_with_sink, ClassificationOutcome, Classifier, Policy, Settings, Stats, Verdict,
};

// How many files are rewritten at the same time
const MAX_CONCURRENT_FILES: usize = 8;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rewrite { files, in_place, stats, json, policy } => {
            let policy = resolve_policy(&policy).await?;
            handle_rewrite(files, in_place, stats, json, policy).await
        }
        Commands::Classify { urls, json, fail_on_nofollow, policy } => {
            let policy = resolve_policy(&policy).await?;
            handle_classify(&urls, json, fail_on_nofollow, &policy)
        }
    }
}

// RUST_LOG wins when set; otherwise warnings only, or debug with -v
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

// Builds the policy snapshot used for the whole run.
//
// A missing or broken settings file is not fatal: we warn and continue with
// the defaults, the same way a page render should not fail over it.
async fn resolve_policy(args: &PolicyArgs) -> Result<Policy> {
    let settings = match &args.config {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };

    let mut policy = settings.policy;
    args.overrides().apply(&mut policy);

    if let Some(ip) = args.client_ip {
        let geo = GeoLookup::new(&settings.geo).context("Failed to set up geo lookup")?;
        policy.geo_exempt = geo.is_geo_exempt(ip).await;
        log::info!("visitor {ip} geo-exempt: {}", policy.geo_exempt);
    }

    Ok(policy)
}

// Handles the 'rewrite' subcommand
async fn handle_rewrite(
    files: Vec<PathBuf>,
    in_place: bool,
    show_stats: bool,
    json: bool,
    policy: Policy,
) -> Result<i32> {
    let policy = Arc::new(policy);

    if files.is_empty() {
        let mut html = String::new();
        tokio::io::stdin()
            .read_to_string(&mut html)
            .await
            .context("Failed to read stdin")?;

        let (output, stats) = rewrite_html(html, Arc::clone(&policy)).await?;
        std::io::stdout().write_all(output.as_bytes())?;

        if show_stats {
            print_stats(&stats, json)?;
        }
        return Ok(0);
    }

    // Rewrite up to MAX_CONCURRENT_FILES files at once. `buffered` (not
    // `buffer_unordered`) so printed output keeps the order of the arguments.
    let results: Vec<(PathBuf, Result<(String, Stats)>)> = stream::iter(files)
        .map(|path| {
            let policy = Arc::clone(&policy);
            async move {
                let result = rewrite_file(&path, policy, in_place).await;
                (path, result)
            }
        })
        .buffered(MAX_CONCURRENT_FILES)
        .collect()
        .await;

    let mut total = Stats::new();
    let mut failures = 0;
    let mut stdout = std::io::stdout();

    for (path, result) in results {
        match result {
            Ok((output, stats)) => {
                if !in_place {
                    stdout.write_all(output.as_bytes())?;
                }
                log::info!("{}: {} link(s) rewritten", path.display(), stats.links_rewritten);
                total.merge(&stats);
            }
            Err(e) => {
                eprintln!("Error: {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    if show_stats {
        print_stats(&total, json)?;
    }

    Ok(if failures > 0 { 2 } else { 0 })
}

async fn rewrite_file(path: &Path, policy: Arc<Policy>, in_place: bool) -> Result<(String, Stats)> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let (output, stats) = rewrite_html(html, policy).await?;

    if in_place && stats.links_rewritten > 0 {
        tokio::fs::write(path, &output)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok((output, stats))
}

// The transform is CPU-bound, so it runs on the blocking pool; several
// files are transformed in parallel against the same shared policy.
async fn rewrite_html(html: String, policy: Arc<Policy>) -> Result<(String, Stats)> {
    let joined = tokio::task::spawn_blocking(move || {
        let mut stats = Stats::new();
        let output = transform_with_sink(&html, &policy, &mut stats);
        (output, stats)
    })
    .await?;
    Ok(joined)
}

// Handles the 'classify' subcommand
fn handle_classify(urls: &[String], json: bool, fail_on_nofollow: bool, policy: &Policy) -> Result<i32> {
    let classifier = Classifier::new(policy);

    let results: Vec<ClassificationOutcome> = urls
        .iter()
        .map(|url| {
            let verdict = classifier.classify(url);
            ClassificationOutcome {
                href: url.clone(),
                verdict,
                changed: verdict.requires_nofollow(),
            }
        })
        .collect();

    print_results(&results, json)?;

    let nofollow_count = results.iter().filter(|r| r.changed).count();
    if fail_on_nofollow && nofollow_count > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the results either as a table or JSON
fn print_results(results: &[ClassificationOutcome], json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        print_table(results);
    }
    Ok(())
}

fn print_table(results: &[ClassificationOutcome]) {
    println!("{:<60} {:<18}", "URL", "VERDICT");
    println!("{}", "=".repeat(78));

    for result in results {
        // Truncate URL if too long for display
        let url_display = if result.href.chars().count() > 57 {
            let head: String = result.href.chars().take(57).collect();
            format!("{}...", head)
        } else {
            result.href.clone()
        };

        println!("{:<60} {:<18}", url_display, format_verdict(result.verdict));
    }

    println!();

    let nofollow_count = results.iter().filter(|r| r.changed).count();
    println!("📊 Summary:");
    println!("   🔗 Nofollow: {}", nofollow_count);
    println!("   ✅ Left alone: {}", results.len() - nofollow_count);
    println!("   📋 Total: {}", results.len());
}

// Statistics go to stderr so they never mix with rewritten HTML on stdout
fn print_stats(stats: &Stats, json: bool) -> Result<()> {
    if json {
        eprintln!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    eprintln!("📊 Summary:");
    eprintln!("   📋 Links seen: {}", stats.links_seen);
    eprintln!("   🔗 Rewritten: {}", stats.links_rewritten);
    for verdict in Verdict::ALL {
        eprintln!("   {:<16} {}", verdict.label(), stats.count(verdict));
    }
    Ok(())
}

fn format_verdict(verdict: Verdict) -> String {
    match verdict {
        Verdict::NotExternal => "🏠 NOT EXTERNAL".to_string(),
        Verdict::BlockedByList => "⛔ BLOCKLISTED".to_string(),
        Verdict::Excluded => "✅ EXCLUDED".to_string(),
        Verdict::GeoExempt => "🌍 GEO EXEMPT".to_string(),
        Verdict::SocialExempt => "👥 SOCIAL EXEMPT".to_string(),
        Verdict::Nofollow => "🔗 NOFOLLOW".to_string(),
    }
}
