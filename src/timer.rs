use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::structs::quiz_type::Seconds;

pub const DEFAULT_DURATION: Seconds = 30;
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

pub type TimeUpCallback = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    state: TimerState,
    remaining: Seconds,
    /// Bumped whenever a tick schedule is started or cancelled.
    /// A ticker only acts while its own run is the current one.
    run: u64,
}

/// Per-question countdown.
///
/// One second of remaining time is consumed per second while running. Reaching
/// zero moves the timer to `Expired` and invokes the time-up callback exactly
/// once. `reset` and `pause` cancel the pending tick schedule, so a cancelled
/// run can never fire.
pub struct Countdown {
    duration: Seconds,
    inner: Arc<Mutex<Inner>>,
    remaining_tx: watch::Sender<Seconds>,
    on_time_up: TimeUpCallback,
    ticker: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(duration: Seconds, on_time_up: impl Fn() + Send + Sync + 'static) -> Self {
        let (remaining_tx, _) = watch::channel(duration);
        Countdown {
            duration,
            inner: Arc::new(Mutex::new(Inner {
                state: TimerState::Idle,
                remaining: duration,
                run: 0,
            })),
            remaining_tx,
            on_time_up: Arc::new(on_time_up),
            ticker: None,
        }
    }

    pub fn start(&mut self) {
        let run = {
            let mut inner = lock(&self.inner);
            match inner.state {
                TimerState::Idle | TimerState::Paused => {}
                TimerState::Running | TimerState::Expired => return,
            }
            inner.state = TimerState::Running;
            inner.run += 1;
            inner.run
        };
        self.cancel_ticker();
        self.ticker = Some(tokio::spawn(tick(
            Arc::clone(&self.inner),
            run,
            self.remaining_tx.clone(),
            Arc::clone(&self.on_time_up),
        )));
    }

    pub fn pause(&mut self) {
        {
            let mut inner = lock(&self.inner);
            if inner.state != TimerState::Running {
                return;
            }
            inner.state = TimerState::Paused;
            inner.run += 1;
        }
        self.cancel_ticker();
    }

    /// Back to `Idle` with the given duration, or the one the timer was created with.
    pub fn reset(&mut self, new_duration: Option<Seconds>) {
        let remaining = new_duration.unwrap_or(self.duration);
        {
            let mut inner = lock(&self.inner);
            inner.state = TimerState::Idle;
            inner.remaining = remaining;
            inner.run += 1;
        }
        self.cancel_ticker();
        self.remaining_tx.send_replace(remaining);
    }

    pub fn remaining(&self) -> Seconds {
        lock(&self.inner).remaining
    }

    pub fn state(&self) -> TimerState {
        lock(&self.inner).state
    }

    pub fn duration(&self) -> Seconds {
        self.duration
    }

    /// Remaining time, updated on every tick and reset.
    pub fn subscribe(&self) -> watch::Receiver<Seconds> {
        self.remaining_tx.subscribe()
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn tick(inner: Arc<Mutex<Inner>>, run: u64, remaining_tx: watch::Sender<Seconds>, on_time_up: TimeUpCallback) {
    let mut interval = time::interval_at(Instant::now() + TICK, TICK);
    loop {
        interval.tick().await;
        let expired = {
            let mut inner = lock(&inner);
            if inner.run != run || inner.state != TimerState::Running {
                return;
            }
            inner.remaining = inner.remaining.saturating_sub(1);
            remaining_tx.send_replace(inner.remaining);
            if inner.remaining == 0 {
                inner.state = TimerState::Expired;
            }
            inner.remaining == 0
        };
        if expired {
            on_time_up();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(duration: Seconds) -> (Countdown, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = Countdown::new(duration, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, fired)
    }

    async fn wait(millis: u64) {
        time::sleep(Duration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn expires_once_after_duration_ticks() {
        let (mut timer, fired) = counting(DEFAULT_DURATION);
        assert_eq!(timer.state(), TimerState::Idle);
        timer.start();

        wait(29_500).await;
        assert_eq!(timer.remaining(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        wait(1_000).await;
        assert_eq!(timer.remaining(), 0);
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        wait(10_000).await;
        timer.start();
        wait(5_000).await;
        assert_eq!(timer.remaining(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_before_expiry_cancels_the_run() {
        let (mut timer, fired) = counting(5);
        timer.start();
        wait(3_500).await;
        assert_eq!(timer.remaining(), 2);

        timer.reset(None);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining(), 5);

        wait(60_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.remaining(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_accepts_a_new_duration() {
        let (mut timer, fired) = counting(30);
        timer.reset(Some(3));
        let remaining = timer.subscribe();
        assert_eq!(*remaining.borrow(), 3);

        timer.start();
        wait(3_500).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(*remaining.borrow(), 0);

        // reset after expiry starts a fresh, independent run
        timer.reset(None);
        assert_eq!(timer.remaining(), 30);
        timer.start();
        wait(30_500).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_holds_remaining_time() {
        let (mut timer, fired) = counting(10);
        timer.start();
        wait(4_500).await;
        timer.pause();
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.remaining(), 6);

        wait(20_000).await;
        assert_eq!(timer.remaining(), 6);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        timer.start();
        wait(5_500).await;
        assert_eq!(timer.remaining(), 1);
        wait(1_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_keeps_a_single_schedule() {
        let (mut timer, fired) = counting(4);
        timer.start();
        wait(1_500).await;
        timer.start();
        timer.start();
        wait(1_000).await;
        assert_eq!(timer.remaining(), 2);
        wait(2_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
