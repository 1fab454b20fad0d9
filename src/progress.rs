use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const TICKS_PER_SECOND: u64 = 2;

/// Prints `message...` and a dot per tick on a background thread until
/// stopped. Dropping the bar stops it, so it is joined on every exit path.
pub struct ProgressBar {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressBar {
    pub fn start(message: &str) -> Self {
        Self::start_with(message, std::io::stdout().is_terminal(), TICKS_PER_SECOND, std::io::stdout())
    }

    pub fn start_with<W: Write + Send + 'static>(
        message: &str,
        ticking: bool,
        ticks_per_second: u64,
        mut out: W,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let message = message.to_owned();
        let tick = Duration::from_millis(1000 / ticks_per_second.max(1));
        let handle = std::thread::spawn(move || {
            let _ = write!(out, "{message}...");
            let _ = out.flush();
            while flag.load(Ordering::Acquire) {
                std::thread::sleep(tick);
                if ticking && flag.load(Ordering::Acquire) {
                    let _ = write!(out, ".");
                    let _ = out.flush();
                }
            }
            let _ = writeln!(out);
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("progress bar thread panicked");
            }
        }
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.stop();
    }
}
