//! devrun - Main entry point.
//!
//! Runs a single command against one or more network devices over SSH.
//!
//! Usage: devrun [OPTIONS]
//!
//! Options:
//!   -d, --device <IPV4>   Run against a single device
//!   -l, --uselist         Run against every device in device-list.txt
//!   -h, --help            Show all options
//!
//! Prompts for username, password (twice), and the command to run.

use std::io;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use devrun::config::Config;
use devrun::driver;
use devrun::logging;
use devrun::prompt::{ConsolePrompter, INTERRUPT_MESSAGE};
use devrun::ssh::Ssh2Connector;
use devrun::{AppError, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = install_interrupt_handler() {
        eprintln!("Warning: cannot watch for Ctrl+C: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_interrupt() => {
            report_interrupt();
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let config = Config::resolve(cli)?;

    // Logging problems never stop a run
    if let Err(e) = logging::init(&config.log_config, cli.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }
    tracing::debug!("Configuration: {:?}", config);

    let source = cli.device_source(&config.device_list);
    let connector = Ssh2Connector::new(config.connect_options());
    let mut prompter = ConsolePrompter::new();

    let summary = driver::run(
        &config,
        &source,
        cli.command.as_deref(),
        &mut prompter,
        &connector,
        &mut io::stdout().lock(),
        &mut io::stderr(),
    )?;
    summary.into_result().map(|_| ())
}

/// Set once the interrupt message has been printed.
static INTERRUPT_REPORTED: AtomicBool = AtomicBool::new(false);

/// Prints the interrupt message at most once.
fn report_interrupt() {
    if !INTERRUPT_REPORTED.swap(true, Ordering::SeqCst) {
        eprintln!("\n{}", INTERRUPT_MESSAGE);
    }
}

/// Exits cleanly on SIGINT, whatever the main thread is blocked on.
///
/// A masked prompt handles Ctrl+C itself so it can turn echo back on; the
/// main thread then unwinds through `PromptError::Interrupted`.
#[cfg(unix)]
fn install_interrupt_handler() -> io::Result<()> {
    use signal_hook::consts::SIGINT;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT])?;
    std::thread::spawn(move || {
        for _ in signals.forever() {
            if devrun::prompt::masked_input_active() {
                tracing::debug!("SIGINT during masked prompt, leaving it to the prompt");
                continue;
            }
            report_interrupt();
            std::process::exit(0);
        }
    });
    Ok(())
}

/// Ctrl+C keeps its default behavior off Unix.
#[cfg(not(unix))]
fn install_interrupt_handler() -> io::Result<()> {
    Ok(())
}
