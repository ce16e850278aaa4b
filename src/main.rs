use anyhow::{Context, Result};
use fs2::FileExt;
use std::{
    fs::File,
    io::{self, Write},
    os::unix::io::AsRawFd,
    sync::Arc,
    sync::atomic::AtomicBool,
    time::Duration,
};
use termios::{os::linux::ECHOCTL, *};

use brightr::config::Config;
use brightr::constants::EXIT_FAILURE;
use brightr::controller::BrightnessController;
use brightr::logger::Log;
use brightr::mode::ModeState;
use brightr::scheduler::SchedulerLoop;
use brightr::signals::spawn_signal_handler;
use brightr::solar::ZipcodeSolarLookup;
use brightr::SysfsBackend;

/// Manages terminal state to hide cursor and suppress control character echoing.
///
/// Restores the original terminal state when dropped, ensuring clean cleanup
/// even if the program exits unexpectedly.
struct TerminalGuard {
    original_termios: Termios,
}

impl TerminalGuard {
    /// Create a new terminal guard and modify terminal settings.
    ///
    /// # Returns
    /// - `Ok(Some(guard))` if terminal is available and settings were applied
    /// - `Ok(None)` if no terminal is available (e.g., running as a service)
    /// - `Err` only for unexpected errors
    fn new() -> io::Result<Option<Self>> {
        let tty = match File::open("/dev/tty") {
            Ok(tty) => tty,
            Err(e) if e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(6) => {
                // No controlling terminal (common in systemd services)
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let fd = tty.as_raw_fd();

        let mut term = Termios::from_fd(fd)?;
        let original = term;

        // Disable the "^C" echo to prevent visual noise during shutdown
        term.c_lflag &= !ECHOCTL;
        tcsetattr(fd, TCSANOW, &term)?;

        // Hide the cursor for cleaner output display
        print!("\x1b[?25l");
        io::stdout().flush()?;

        Ok(Some(Self {
            original_termios: original,
        }))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort restore of termios + cursor visibility
        if let Ok(tty) = File::open("/dev/tty") {
            let _ = tcsetattr(tty.as_raw_fd(), TCSANOW, &self.original_termios);
        }
        let _ = write!(io::stdout(), "\x1b[?25h");
        let _ = io::stdout().flush();
    }
}

/// Release and remove the instance lock file on shutdown.
fn cleanup(lock_file: File, lock_path: &str) {
    Log::log_decorated("Performing cleanup...");

    drop(lock_file);

    if let Err(e) = std::fs::remove_file(lock_path) {
        Log::log_decorated(&format!("Warning: Failed to remove lock file: {}", e));
    } else {
        Log::log_decorated("Lock file removed successfully");
    }

    Log::log_decorated("Cleanup complete");
}

fn main() -> Result<()> {
    // Set up terminal features; gracefully handles headless operation
    let _term = TerminalGuard::new().context("failed to initialize terminal features")?;

    // Handle version flag
    if std::env::args()
        .nth(1)
        .is_some_and(|arg| arg == "--version" || arg == "-v")
    {
        println!("brightr {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    Log::log_version();

    // Shared state between the scheduler loop and the signal thread
    let running = Arc::new(AtomicBool::new(true));
    let mode = Arc::new(ModeState::new());

    spawn_signal_handler(Arc::clone(&running), Arc::clone(&mode))?;

    // Create and acquire lock file
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    let lock_path = format!("{}/brightr.lock", runtime_dir);
    let lock_file = File::create(&lock_path)?;

    if lock_file.try_lock_exclusive().is_err() {
        Log::log_error(
            "Another instance of brightr is already running.\n\
            • Kill brightr before restarting.",
        );
        std::process::exit(EXIT_FAILURE);
    }
    Log::log_decorated("Lock acquired, starting brightr...");

    // Load and validate configuration; failures here are fatal
    let config = Config::load()?;
    config.log_config();

    // Wire up the brightness backend and solar lookup collaborators
    let backend = SysfsBackend::new()?;
    let lookup = ZipcodeSolarLookup::new()?;

    let mut controller = BrightnessController::new(
        config.curve_parameters(),
        config.solar_config(),
        Box::new(lookup),
        Box::new(backend),
    );
    Log::log_decorated(&format!("Brightness backend: {}", controller.backend_name()));

    let scheduler = SchedulerLoop::new(
        Duration::from_secs(config.update_interval_secs()),
        Arc::clone(&running),
        Arc::clone(&mode),
    );

    Log::log_block_start(&format!(
        "Scheduling brightness updates every {} seconds",
        config.update_interval_secs()
    ));
    scheduler.run(&mut controller);

    Log::log_block_start("Shutting down brightr...");
    cleanup(lock_file, &lock_path);
    Log::log_end();

    Ok(())
}
