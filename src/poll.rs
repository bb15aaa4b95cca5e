//! Repeating tick tasks for progress and lyric sync.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How often playback progress is sampled.
pub const PROGRESS_POLL_MILLIS: u64 = 1000;

/// A restartable repeating tick task.
///
/// `start` always cancels the previous task before spawning a new one, so a
/// poller never runs two tickers at once no matter how often playback is
/// restarted.
#[derive(Default)]
pub struct Poller {
    token: Option<CancellationToken>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }

    /// Send `message` on `tx` every `period` until stopped.
    ///
    /// The first tick fires one full period after the call, not immediately.
    /// The task also exits on its own when the receiver is dropped.
    pub fn start<T>(&mut self, period: Duration, tx: mpsc::UnboundedSender<T>, message: T)
    where
        T: Clone + Send + 'static,
    {
        self.stop();

        let token = CancellationToken::new();
        let task_token = token.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval's first tick completes immediately; swallow it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(message.clone()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.token = Some(token);
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
