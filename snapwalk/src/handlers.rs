use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

// Helper functions for crawl handler

/// Load identifiers from a file when `input` names one, otherwise treat `input`
/// itself as a single identifier.
pub fn load_identifiers_from_source(input: &str) -> Result<Vec<String>, String> {
    let path = Path::new(input);
    if path.is_file() {
        return load_identifiers_from_file(path);
    }

    parse_identifier_line(input)
        .map(|identifier| vec![identifier])
        .ok_or_else(|| format!("'{}' is neither a readable file nor a valid login", input))
}

/// Load identifiers from a newline-delimited file. Blank lines and lines
/// starting with `#` are ignored.
pub fn load_identifiers_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read input file {}: {}", path.display(), e))?;

    let identifiers: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_identifier_line)
        .collect();

    if identifiers.is_empty() {
        return Err(format!("No valid logins found in {}", path.display()));
    }

    Ok(identifiers)
}

/// Parse one login. A leading `@` is dropped.
pub fn parse_identifier_line(line: &str) -> Option<String> {
    let login = line.trim();
    let login = login.strip_prefix('@').unwrap_or(login);

    let valid = !login.is_empty()
        && login != "."
        && login != ".."
        && !login
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#'));
    if valid {
        Some(login.to_string())
    } else {
        eprintln!("⚠️  Skipping invalid login '{}'", line);
        None
    }
}

// Re-export crawl types and functions from snapwalk-core
pub use snapwalk_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
pub use snapwalk_core::report::{ReportFormat, generate_crawl_report, render_report};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_progress_line(line: String) {
    if line.starts_with(">> error") {
        println!("{}", line.red());
    } else {
        println!("{}", line.green());
    }
}

pub async fn handle_crawl(sub_matches: &ArgMatches) {
    init_tracing();

    let Some(input) = sub_matches.get_one::<String>("input") else {
        eprintln!("✗ --input is required");
        std::process::exit(1);
    };
    let depth = *sub_matches.get_one::<u32>("depth").unwrap_or(&1);
    let workers = *sub_matches.get_one::<u32>("workers").unwrap_or(&10) as usize;
    let output = sub_matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(".");
    let check = sub_matches.get_flag("check");
    let base_url = sub_matches
        .get_one::<Url>("base-url")
        .map(Url::to_string)
        .unwrap_or_else(|| snapwalk_scanner::source::DEFAULT_BASE_URL.to_string());
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let quiet = sub_matches.get_flag("quiet");

    // Load identifiers from source
    let identifiers = match load_identifiers_from_source(input) {
        Ok(identifiers) => identifiers,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    let output_dir = PathBuf::from(shellexpand::tilde(output).into_owned());

    // Print crawl configuration, kept off stdout when a machine-readable report follows
    if format == ReportFormat::Text && !quiet {
        println!(
            "\n{} Crawling {} profile(s)",
            "→".blue(),
            identifiers.len().to_string().bright_white()
        );
        println!("Workers: {}", workers);
        println!("Max depth: {}", depth);
        println!("Output: {}", output_dir.display());
        if check {
            println!("Skipping profiles already in the output directory");
        }
        println!();
    }

    let options = CrawlOptions {
        identifiers,
        workers,
        max_depth: depth,
        output_dir,
        skip_crawled: check,
        base_url,
        timeout_secs,
        show_progress_bars: !quiet,
    };

    let progress_callback: Option<CrawlProgressCallback> =
        if quiet || format == ReportFormat::Json {
            None
        } else {
            Some(Arc::new(print_progress_line))
        };

    let run = match execute_crawl(options, progress_callback).await {
        Ok(run) => run,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match render_report(&run, format) {
        Ok(report) => print!("{}", report),
        Err(e) => {
            eprintln!("{} Failed to render report: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
