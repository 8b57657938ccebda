//! Shift Sync Entry Point
//!
//! Usage:
//!   shift-sync [OPTIONS]
//!
//! Options:
//!   -u, --url <URL>      Sync server base URL
//!   -c, --config <FILE>  Configuration file
//!   --headless           Run one sync and print status lines

use std::io::{self, IsTerminal};
use std::panic;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use shift_sync_tui::logging::{default_log_path, init_logging, LogTarget};
use shift_sync_tui::{headless, App, Cli, Prefill};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.headless {
        init_logging(&cli.log_level, &LogTarget::Stderr)?;
        return headless::run(&cli).await;
    }

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: shift-sync requires a terminal (TTY)");
        eprintln!();
        eprintln!("For scripts and CI, run a single sync without the UI:");
        eprintln!("  shift-sync --headless --venue <ID> --user <ID> --pin <PIN> --token <TOKEN>");
        std::process::exit(1);
    }

    init_logging(&cli.log_level, &LogTarget::File(default_log_path()))?;
    let config = cli.resolve_config().context("Invalid configuration")?;
    tracing::info!(source = %config.source(), url = %config.base_url, "Configuration resolved");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut app = App::new(config)?;
    app.prefill(Prefill {
        token: cli.token.clone(),
        venue: cli.venue.clone(),
        user: cli.user.clone(),
        pin: cli.pin.clone(),
    })
    .await;

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Show the last status after the TUI closes
    if result.is_ok() {
        println!("{}", app.final_status());
    }

    // Propagate any errors
    result
}
