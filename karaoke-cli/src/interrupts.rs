//! Ctrl+C handling: cancel a running playback, otherwise quit.

use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Exit status used when the user interrupts outside of playback
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Clone, Default)]
pub struct Interrupts {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Install the process-wide Ctrl+C handler
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let active = Arc::clone(&self.active);
        ctrlc::set_handler(move || {
            let token = active.lock().ok().and_then(|guard| guard.clone());
            if let Some(token) = token {
                info!("Received Ctrl+C, stopping playback...");
                token.cancel();
            } else {
                info!("Received Ctrl+C, exiting");
                eprintln!("\nProgram terminated.");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
    }

    /// Route Ctrl+C to a fresh token until the guard is dropped
    pub fn begin_playback(&self) -> PlaybackGuard {
        let token = CancellationToken::new();
        if let Ok(mut guard) = self.active.lock() {
            *guard = Some(token.clone());
        }
        PlaybackGuard {
            active: Arc::clone(&self.active),
            token,
        }
    }
}

pub struct PlaybackGuard {
    active: Arc<Mutex<Option<CancellationToken>>>,
    token: CancellationToken,
}

impl PlaybackGuard {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.active.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_registers_and_clears_token() {
        let interrupts = Interrupts::default();
        {
            let guard = interrupts.begin_playback();
            let active = interrupts.active.lock().unwrap().clone().unwrap();
            active.cancel();
            assert!(guard.token().is_cancelled());
        }
        assert!(interrupts.active.lock().unwrap().is_none());
    }
}
