//! pilot: drive a visible browser tab through a conversational agent
//!
//! Usage:
//!   pilot            - Open the browser, wait for login, then start the prompt
//!   pilot --help     - Show help
//!   pilot --version  - Show version

mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pilot_browser::{BrowserConfig, BrowserSession, register_browser_tools};
use pilot_core::{AssistantsClient, Config, Runner, RunnerConfig, ToolRegistry};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// Interactive session
    Run,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    match parse_args() {
        RunMode::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        RunMode::Version => {
            println!("pilot {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        RunMode::Run => match run().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("\n❌ {:#}\n", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().context("Config error")?;

    // Logs go to stderr so the conversation on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting pilot...");
    tracing::info!("Model: {}", config.llm.model);

    let session = Arc::new(launch_browser(&config).await?);

    let mut registry = ToolRegistry::new();
    register_browser_tools(&mut registry, Arc::clone(&session));
    tracing::info!(
        "Registered {} tools: {:?}",
        registry.len(),
        registry.tool_names()
    );

    let client = AssistantsClient::new(&config).context("Failed to create agent client")?;
    let assistant_id = client
        .create_assistant(
            &config.llm.assistant_name,
            &config.llm.model,
            &config.load_instructions(),
            &registry.describe_all(),
        )
        .await
        .context("Failed to create assistant")?;
    let client = client.with_assistant(assistant_id);

    let runner = Runner::start(Arc::new(client), registry, RunnerConfig::from(&config.run))
        .await
        .context("Failed to start conversation")?;

    wait_for_login(&session, &config.browser.login_url).await?;

    cli::run_cli(runner, session).await
}

async fn launch_browser(config: &Config) -> anyhow::Result<BrowserSession> {
    let browser_config = BrowserConfig::builder()
        .headless(config.browser.headless)
        .window_size(config.browser.window_size)
        .idle_timeout(Duration::from_secs(config.browser.idle_timeout_secs))
        .build();
    let click_timeout = Duration::from_millis(config.browser.click_timeout_ms);

    let session = tokio::task::spawn_blocking(move || BrowserSession::launch(&browser_config))
        .await
        .context("Browser launch task failed")?
        .context("Failed to launch the browser")?;

    Ok(session.with_click_timeout(click_timeout))
}

/// Open the login page and block until the user confirms they are signed in
async fn wait_for_login(session: &Arc<BrowserSession>, login_url: &str) -> anyhow::Result<()> {
    let nav_session = Arc::clone(session);
    let url = login_url.to_string();
    tokio::task::spawn_blocking(move || nav_session.navigate(&url))
        .await
        .context("Browser task failed")?
        .with_context(|| format!("Failed to open {}", login_url))?;

    tokio::task::spawn_blocking(|| {
        use std::io::Write;

        print!("🔑  Log in in the browser window, then press <Enter> here to continue… ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .context("Input task failed")?
    .context("Failed to read from stdin")?;

    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Run
}

/// Print help message
fn print_help() {
    println!("pilot - drive a browser tab through a conversational agent");
    println!();
    println!("Usage:");
    println!("  pilot            Open the browser, wait for login, then start the prompt");
    println!("  pilot --help     Show this help message");
    println!("  pilot --version  Show version");
    println!();
    println!("Configuration is read from ./pilot.toml when present, then from the environment.");
    println!();
    println!("Environment Variables:");
    println!("  OPENAI_API_KEY          API key (required)");
    println!("  PILOT_MODEL             Model name (default: gpt-4.1-nano)");
    println!("  OPENAI_BASE_URL         Custom API endpoint");
    println!("  PILOT_INSTRUCTIONS      Instructions file (default: prompt.txt)");
    println!("  PILOT_LOGIN_URL         Page opened for the manual login step");
    println!("  PILOT_HEADLESS          Run the browser headless (default: false)");
    println!("  PILOT_CLICK_TIMEOUT_MS  Default click timeout (default: 8000)");
    println!("  PILOT_POLL_INTERVAL_MS  Run poll interval (default: 400)");
    println!("  PILOT_MAX_WAIT_SECS     Longest wait for one run (default: 300)");
    println!("  PILOT_LOG               Log filter when RUST_LOG is unset (default: warn)");
}
