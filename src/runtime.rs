use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Interval between countdown ticks
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);
/// Redraw cadence when no input arrives, for animations
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// One countdown second has elapsed
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // release/repeat events are reported on some platforms; only presses count
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn countdown() -> Self {
        Self::new(COUNTDOWN_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event at a time.
///
/// Countdown ticks are only produced while the countdown is armed. Disarming takes
/// effect immediately: no tick is yielded after `disarm` until the next `arm`.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    frame_interval: Duration,
    next_tick: Option<Instant>,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            frame_interval: FRAME_INTERVAL,
            next_tick: None,
        }
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Start the countdown; the first tick arrives one interval from now
    pub fn arm(&mut self) {
        self.next_tick = Some(Instant::now() + self.ticker.interval());
    }

    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Blocks up to the next deadline (tick or frame) and returns the next event.
    /// `None` means a frame elapsed with nothing to report.
    pub fn step(&mut self) -> Option<AppEvent> {
        let now = Instant::now();
        if let Some(deadline) = self.next_tick {
            if now >= deadline {
                // keep the cadence anchored so each elapsed interval yields exactly one tick
                self.next_tick = Some(deadline + self.ticker.interval());
                return Some(AppEvent::Tick);
            }
        }

        let wait = match self.next_tick {
            Some(deadline) => deadline.saturating_duration_since(now).min(self.frame_interval),
            None => self.frame_interval,
        };

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(wait);
                None
            }
        }
    }
}
