use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::{location::Location, time_window::TimeWindow};

define_index_newtype!(StopIdx, Stop);

/// Delivery priority, 1 = highest, 5 = lowest. New stops without an explicit
/// priority get [`Priority::DEFAULT`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const DEFAULT: Priority = Priority(3);
    pub const LOWEST: Priority = Priority(5);

    /// Clamps into the valid 1..=5 range.
    pub fn new(level: u8) -> Self {
        Priority(level.clamp(1, 5))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// Weight used in scoring: 5 for the highest priority down to 1.
    pub fn weight(&self) -> f64 {
        (6 - self.0) as f64
    }

    pub fn is_default(&self) -> bool {
        *self == Priority::DEFAULT
    }

    pub fn is_high(&self) -> bool {
        self.0 <= 2
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

/// One delivery stop. Immutable for the duration of an optimization run.
#[derive(Clone, Debug, Serialize)]
pub struct Stop {
    external_id: String,
    location: Location,
    demand: u32,
    priority: Priority,
    time_window: Option<TimeWindow>,
    service_duration: SignedDuration,
}

impl Stop {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn demand(&self) -> u32 {
        self.demand
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn service_duration(&self) -> SignedDuration {
        self.service_duration
    }
}

#[derive(Default)]
pub struct StopBuilder {
    external_id: Option<String>,
    location: Option<Location>,
    demand: Option<u32>,
    priority: Option<Priority>,
    time_window: Option<TimeWindow>,
    service_duration: Option<SignedDuration>,
}

impl StopBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut StopBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_location(&mut self, location: Location) -> &mut StopBuilder {
        self.location = Some(location);
        self
    }

    pub fn set_demand(&mut self, demand: u32) -> &mut StopBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut StopBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut StopBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_service_duration(&mut self, service_duration: SignedDuration) -> &mut StopBuilder {
        self.service_duration = Some(service_duration);
        self
    }

    pub fn build(self) -> Stop {
        Stop {
            external_id: self.external_id.expect("external id is required"),
            location: self.location.expect("location is required"),
            demand: self.demand.unwrap_or(0),
            priority: self.priority.unwrap_or_default(),
            time_window: self.time_window,
            service_duration: self
                .service_duration
                .unwrap_or(SignedDuration::from_mins(5)),
        }
    }
}
