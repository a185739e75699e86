//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;
use url::Url;

use tenderlens_core::{
    DetailPayload, Envelope, ErrorEnvelope, ListingPayload, harvest_cookies, listing_url,
    scrape_detail, scrape_listing,
};
use tenderlens_extract::{SiteRegistry, extract_detail, extract_listing};
use tenderlens_session::HttpSession;
use tenderlens_shared::{
    AppConfig, RawPageContent, Result as TlResult, SiteSchema, TenderlensError, init_config,
    load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// tenderlens: structured records from procurement portal pages.
#[derive(Parser)]
#[command(
    name = "tenderlens",
    version,
    about = "Scrape procurement portal listings and detail pages into structured JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Visit a site's landing page and print the session cookies.
    Cookies {
        /// Site id (see `tenderlens sites`).
        #[arg(long)]
        site: String,
    },

    /// Scrape one listing page.
    List {
        /// Site id.
        #[arg(long)]
        site: String,

        /// Listing offset substituted into the site's listing URL.
        #[arg(long)]
        startnum: Option<u32>,

        /// Scrape this URL instead of the site's listing URL.
        #[arg(long)]
        url: Option<String>,
    },

    /// Scrape one detail page, including attachment links.
    Detail {
        /// Site id.
        #[arg(long)]
        site: String,

        /// Detail page URL.
        #[arg(long)]
        url: String,
    },

    /// Run extraction offline on saved page text (and HTML).
    Extract {
        /// Site id.
        #[arg(long)]
        site: String,

        /// File holding the rendered page text.
        #[arg(long)]
        text: PathBuf,

        /// File holding the page HTML (used for attachments).
        #[arg(long)]
        html: Option<PathBuf>,

        /// URL the page was saved from; relative links resolve against it.
        #[arg(long)]
        url: Option<String>,

        /// Treat the page as a detail page instead of a listing.
        #[arg(long)]
        detail: bool,
    },

    /// List the registered site schemas.
    Sites,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// only the JSON response.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tenderlens=info",
        1 => "tenderlens=debug",
        _ => "tenderlens=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Cookies { site } => respond(cmd_cookies(&site).await),
        Command::List {
            site,
            startnum,
            url,
        } => respond(cmd_list(&site, startnum, url.as_deref()).await),
        Command::Detail { site, url } => respond(cmd_detail(&site, &url).await),
        Command::Extract {
            site,
            text,
            html,
            url,
            detail,
        } => respond(cmd_extract(&site, &text, html.as_deref(), url.as_deref(), detail)),
        Command::Sites => cmd_sites(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Print the success envelope, or the failure envelope and fail the process.
fn respond(result: TlResult<String>) -> Result<()> {
    match result {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            println!("{}", ErrorEnvelope::new(&e).to_json_pretty()?);
            Err(e.into())
        }
    }
}

fn load_registry() -> TlResult<(AppConfig, SiteRegistry)> {
    let config = load_config()?;
    let registry = SiteRegistry::with_overrides(config.sites.clone())?;
    Ok((config, registry))
}

fn new_session(config: &AppConfig, site: &SiteSchema) -> TlResult<HttpSession> {
    HttpSession::new(&config.session, config.session.settle_for(site))
}

fn parse_url(raw: &str) -> TlResult<Url> {
    Url::parse(raw).map_err(|e| TenderlensError::parse(format!("invalid URL '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// Scrape commands
// ---------------------------------------------------------------------------

async fn cmd_cookies(site_id: &str) -> TlResult<String> {
    let (config, registry) = load_registry()?;
    let site = registry.get(site_id)?;
    let mut session = new_session(&config, site)?;

    info!(site = %site.id, "harvesting cookies");
    let spinner = Spinner::new(format!("Opening {}", site.name));
    let payload = harvest_cookies(&mut session, site).await;
    spinner.finish();

    Envelope::ok(payload?).to_json_pretty()
}

async fn cmd_list(site_id: &str, startnum: Option<u32>, url: Option<&str>) -> TlResult<String> {
    let (config, registry) = load_registry()?;
    let site = registry.get(site_id)?;
    let url = match url {
        Some(raw) => parse_url(raw)?,
        None => listing_url(site, startnum)?,
    };
    let mut session = new_session(&config, site)?;

    info!(site = %site.id, %url, "scraping listing");
    let spinner = Spinner::new(format!("Rendering {url}"));
    let payload = scrape_listing(&mut session, site, &url).await;
    spinner.finish();

    Envelope::ok(payload?).to_json_pretty()
}

async fn cmd_detail(site_id: &str, url: &str) -> TlResult<String> {
    let (config, registry) = load_registry()?;
    let site = registry.get(site_id)?;
    let url = parse_url(url)?;
    let mut session = new_session(&config, site)?;

    info!(site = %site.id, %url, "scraping detail page");
    let spinner = Spinner::new(format!("Rendering {url}"));
    let payload = scrape_detail(&mut session, site, &url).await;
    spinner.finish();

    Envelope::ok(payload?).to_json_pretty()
}

fn cmd_extract(
    site_id: &str,
    text: &Path,
    html: Option<&Path>,
    url: Option<&str>,
    detail: bool,
) -> TlResult<String> {
    let (_config, registry) = load_registry()?;
    extract_offline(&registry, site_id, text, html, url, detail)
}

fn extract_offline(
    registry: &SiteRegistry,
    site_id: &str,
    text: &Path,
    html: Option<&Path>,
    url: Option<&str>,
    detail: bool,
) -> TlResult<String> {
    let site = registry.get(site_id)?;

    let text_content = read_file(text)?;
    let html_content = html.map(read_file).transpose()?.unwrap_or_default();
    let mut page = RawPageContent::new(text_content, html_content);
    if let Some(raw) = url {
        page = page.with_url(parse_url(raw)?.as_str());
    }
    let source = url.map(String::from).unwrap_or_else(|| text.display().to_string());

    info!(site = %site.id, source = %source, detail, "extracting offline");

    if detail {
        let schema = site.detail.as_ref().ok_or_else(|| {
            TenderlensError::validation(format!("site '{}' declares no detail schema", site.id))
        })?;
        let extraction = extract_detail(&page, schema, &site.origin_url()?, &site.attachments);
        Envelope::ok(DetailPayload {
            url: source,
            site: site.id.clone(),
            record: extraction.record,
            attachments: extraction.attachments,
            diagnostics: extraction.diagnostics,
            cookies: String::new(),
        })
        .to_json_pretty()
    } else {
        let strategy = site.listing.as_ref().ok_or_else(|| {
            TenderlensError::validation(format!("site '{}' declares no listing strategy", site.id))
        })?;
        let extraction = extract_listing(&page, strategy);
        Envelope::ok(ListingPayload {
            url: source,
            site: site.id.clone(),
            total_records: extraction.records.len(),
            records: extraction.records,
            diagnostics: extraction.diagnostics,
            cookies: String::new(),
        })
        .to_json_pretty()
    }
}

fn read_file(path: &Path) -> TlResult<String> {
    std::fs::read_to_string(path).map_err(|e| TenderlensError::io(path, e))
}

// ---------------------------------------------------------------------------
// Sites & config
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SiteSummary<'a> {
    id: &'a str,
    name: &'a str,
    origin: &'a str,
    listing: Option<&'static str>,
    detail: bool,
}

fn cmd_sites() -> Result<()> {
    let (_config, registry) = load_registry()?;
    let summaries: Vec<SiteSummary<'_>> = registry
        .iter()
        .map(|site| SiteSummary {
            id: &site.id,
            name: &site.name,
            origin: &site.origin,
            listing: site.listing.as_ref().map(|l| l.id()),
            detail: site.detail.is_some(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Stderr spinner shown while a page renders and settles.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn new(message: String) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_arguments_parse() {
        let cli = Cli::try_parse_from(["tenderlens", "list", "--site", "nyscr", "--startnum", "21"])
            .unwrap();
        match cli.command {
            Command::List { site, startnum, url } => {
                assert_eq!(site, "nyscr");
                assert_eq!(startnum, Some(21));
                assert!(url.is_none());
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn extract_requires_text_file() {
        assert!(Cli::try_parse_from(["tenderlens", "extract", "--site", "nyscr"]).is_err());
    }

    #[test]
    fn offline_extract_of_fixture() {
        let registry = SiteRegistry::builtin().unwrap();
        let json = extract_offline(
            &registry,
            "nyscr",
            Path::new("../../fixtures/pages/nyscr-ads.txt"),
            None,
            None,
            false,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], serde_json::json!(true));
        assert_eq!(value["totalRecords"], serde_json::json!(4));
        assert_eq!(value["site"], serde_json::json!("nyscr"));
    }

    #[test]
    fn offline_detail_extract_of_fixture() {
        let registry = SiteRegistry::builtin().unwrap();
        let json = extract_offline(
            &registry,
            "caleprocure",
            Path::new("../../fixtures/pages/caleprocure-events.txt"),
            Some(Path::new("../../fixtures/pages/caleprocure-event.html")),
            Some("https://caleprocure.ca.gov/event/3860/0000032215"),
            true,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["url"], serde_json::json!("https://caleprocure.ca.gov/event/3860/0000032215"));
        assert_eq!(value["attachments"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn offline_extract_of_unknown_site_fails() {
        let registry = SiteRegistry::builtin().unwrap();
        let err = extract_offline(
            &registry,
            "texas",
            Path::new("../../fixtures/pages/nyscr-ads.txt"),
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, TenderlensError::UnknownSite(_)));
    }
}
