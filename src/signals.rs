//! Signal handling for shutdown and the auto/manual mode toggle.
//!
//! SIGTERM, SIGINT, and SIGHUP request shutdown by clearing the shared
//! running flag, which interrupts the scheduler's wait within one check
//! interval. SIGUSR1 is the external toggle surface (tray menus or shell
//! aliases send it) and flips the Auto/Manual mode in place.

use anyhow::Result;
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use crate::logger::Log;
use crate::mode::{Mode, ModeState};

/// Spawn the signal handling thread.
///
/// The thread lives for the rest of the process; it only reads/writes the
/// shared atomics, so there is nothing to join on shutdown.
pub fn spawn_signal_handler(running: Arc<AtomicBool>, mode: Arc<ModeState>) -> Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP, SIGUSR1])?;

    thread::spawn(move || {
        for signal in signals.forever() {
            match signal {
                SIGUSR1 => {
                    let new_mode = mode.toggle();
                    let label = match new_mode {
                        Mode::Auto => "auto",
                        Mode::Manual => "manual",
                    };
                    Log::log_block_start(&format!("Mode toggled: now {}", label));
                    if new_mode == Mode::Manual {
                        if let Some(percent) = mode.last_applied() {
                            Log::log_indented(&format!("Holding at {}%", percent));
                        }
                    }
                }
                _ => {
                    Log::log_pipe();
                    Log::log_info(&format!("Shutdown signal received: {:?}", signal));
                    running.store(false, Ordering::SeqCst);
                }
            }
        }
    });

    Ok(())
}
