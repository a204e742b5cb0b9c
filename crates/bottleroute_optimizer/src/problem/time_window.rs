use jiff::SignedDuration;
use serde::Serialize;

/// Delivery window expressed as offsets from the route start.
///
/// The core has no calendar anchor, so windows are relative: "reachable
/// between 30 and 90 minutes into the tour". `start < end` is enforced at
/// construction; invalid windows coming from callers are dropped during
/// orchestrator preprocessing instead.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct TimeWindow {
    start: SignedDuration,
    end: SignedDuration,
}

impl TimeWindow {
    pub fn new(start: SignedDuration, end: SignedDuration) -> Option<Self> {
        if start < end {
            Some(TimeWindow { start, end })
        } else {
            None
        }
    }

    pub fn from_minutes(start: i64, end: i64) -> Option<Self> {
        Self::new(
            SignedDuration::from_mins(start),
            SignedDuration::from_mins(end),
        )
    }

    pub fn start(&self) -> SignedDuration {
        self.start
    }

    pub fn end(&self) -> SignedDuration {
        self.end
    }

    pub fn is_satisfied(&self, arrival: SignedDuration) -> bool {
        arrival <= self.end
    }

    /// Minutes past the window end, zero when on time.
    pub fn overtime_mins(&self, arrival: SignedDuration) -> i64 {
        ((arrival - self.end).as_secs() / 60).max(0)
    }
}
