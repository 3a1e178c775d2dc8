use anyhow::{Context, Result};
use clap::Parser;
use paypage_check::{
    pay_section_suite, ChromeDriver, PageSession, PaySectionPage, SuiteConfig, SuiteReport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run the bill-payment section checks against a live Chrome.
#[derive(Parser, Debug)]
#[command(name = "paypage-check", version, about)]
struct Cli {
    /// JSON suite configuration; flags below override its values
    #[arg(long, env = "PAYPAGE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "PAYPAGE_START_URL")]
    start_url: Option<String>,

    #[arg(long, env = "PAYPAGE_HEADLESS")]
    headless: bool,

    /// Only run scenarios whose name contains this text
    #[arg(long)]
    filter: Option<String>,

    #[arg(long)]
    page_timeout_ms: Option<u64>,

    #[arg(long)]
    overlay_timeout_ms: Option<u64>,

    /// Print the suite report as JSON instead of one line per scenario
    #[arg(long)]
    json: bool,

    /// List the selected scenarios without starting a browser
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn suite_config(&self) -> Result<SuiteConfig> {
        let mut config = match &self.config {
            Some(path) => SuiteConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SuiteConfig::default(),
        };

        if let Some(url) = &self.start_url {
            config.start_url = url.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(ms) = self.page_timeout_ms {
            config.waits.page_timeout_ms = ms;
        }
        if let Some(ms) = self.overlay_timeout_ms {
            config.waits.overlay_timeout_ms = ms;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn print_report(report: &SuiteReport) {
    for result in &report.results {
        match &result.failure {
            None => println!("PASS {} ({}ms)", result.name, result.duration_ms),
            Some(failure) => println!(
                "FAIL {} ({}ms): {}",
                result.name, result.duration_ms, failure
            ),
        }
    }
    println!(
        "\n{} passed, {} failed (run {})",
        report.passed(),
        report.failed(),
        report.run_id
    );
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let suite = pay_section_suite::<ChromeDriver>().with_filter(cli.filter.clone());

    if cli.list {
        for (name, description) in suite.list() {
            println!("{:<32} {}", name, description);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.suite_config()?;
    info!(start_url = %config.start_url, headless = config.browser.headless, "starting suite");

    let driver = ChromeDriver::new().with_navigation_timeout(config.waits.navigation_timeout());
    let session = PageSession::launch(driver, &config.browser, config.waits)
        .await
        .context("starting Chrome")?;
    let mut page = PaySectionPage::new(session, config.start_url.clone())
        .with_overrides(&config.locator_overrides)
        .context("applying locator overrides")?;

    let report = suite.run(&mut page).await;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
