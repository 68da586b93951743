//! Debounced content size reporting
//!
//! Size changes arrive in bursts while the panel lays out. Each observation
//! pushes the deadline out by the debounce window; once the window passes
//! quietly a single `sizeChanged` carries the latest size plus padding.

use resultsview_core::{Outbound, RouterConfig, Size};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ResizeNotifier {
    window: Duration,
    padding: Size,
    latest: Option<Size>,
    deadline: Option<Instant>,
}

impl ResizeNotifier {
    pub fn new(window: Duration, padding: Size) -> Self {
        Self {
            window,
            padding,
            latest: None,
            deadline: None,
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(
            config.resize_debounce,
            Size {
                width: config.resize_padding_width,
                height: config.resize_padding_height,
            },
        )
    }

    /// Record a new content size seen at `now`
    pub fn observe(&mut self, size: Size, now: Instant) {
        self.latest = Some(size);
        self.deadline = Some(now + self.window);
    }

    /// When the pending report becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the pending report
    pub fn fire(&mut self) -> Option<Outbound> {
        self.deadline = None;
        self.latest.take().map(|size| Outbound::SizeChanged {
            width: size.width + self.padding.width,
            height: size.height + self.padding.height,
        })
    }
}
