#![forbid(unsafe_code)]

//! Infinite-scroll pagination state.

use std::time::Duration;

use web_time::Instant;

/// Where a paginated list stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Last page loaded, starting at 1.
    pub current_page: u32,
    /// A request for the next page is in flight.
    pub is_paginating: bool,
    /// No more pages exist.
    pub is_last_page: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            is_paginating: false,
            is_last_page: false,
        }
    }
}

impl Pagination {
    /// The page after the current one.
    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.current_page.saturating_add(1)
    }

    /// Whether another page may be requested now.
    #[must_use]
    pub const fn can_request(&self) -> bool {
        !self.is_paginating && !self.is_last_page
    }

    /// The next page to request, if the viewport has scrolled past the
    /// trigger point: within `threshold` of the end of the content.
    ///
    /// Degenerate geometry (no content or no viewport) never triggers.
    #[must_use]
    pub fn should_request_next(
        &self,
        offset: f64,
        content_extent: f64,
        viewport: f64,
        threshold: f64,
    ) -> Option<u32> {
        if content_extent <= 0.0 || viewport <= 0.0 {
            return None;
        }
        let trigger = content_extent - viewport - threshold;
        (offset > trigger && self.can_request()).then(|| self.next_page())
    }

    /// State while the next page loads.
    #[must_use]
    pub const fn started(self) -> Self {
        Self {
            is_paginating: true,
            ..self
        }
    }

    /// State after a page arrived.
    #[must_use]
    pub const fn loaded(self, is_last_page: bool) -> Self {
        Self {
            current_page: self.current_page.saturating_add(1),
            is_paginating: false,
            is_last_page,
        }
    }

    /// State after a page request failed. The page can be requested again.
    #[must_use]
    pub const fn failed(self) -> Self {
        Self {
            is_paginating: false,
            ..self
        }
    }
}

/// Rate-limits pagination checks driven by scroll events.
#[derive(Debug, Clone)]
pub struct PaginationTrigger {
    threshold: f64,
    min_interval: Duration,
    last_check: Option<Instant>,
}

impl PaginationTrigger {
    /// Default spacing between checks.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);

    /// A trigger firing within `threshold` of the end.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            min_interval: Self::DEFAULT_INTERVAL,
            last_check: None,
        }
    }

    /// Override the spacing between checks.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Handle a scroll event at `now`. Returns the page to request, if any.
    ///
    /// Only user-driven scrolls count, and at most one check runs per
    /// interval.
    pub fn on_scroll(
        &mut self,
        now: Instant,
        state: &Pagination,
        dragging: bool,
        offset: f64,
        content_extent: f64,
        viewport: f64,
    ) -> Option<u32> {
        if !dragging {
            return None;
        }
        if let Some(last) = self.last_check {
            if now.saturating_duration_since(last) <= self.min_interval {
                return None;
            }
        }
        self.last_check = Some(now);
        state.should_request_next(offset, content_extent, viewport, self.threshold)
    }
}
