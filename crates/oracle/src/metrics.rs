// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Metric handles the cycle loop records into.

use quorus_types::traits::metrics::{Counter, Gauge, Histogram, Metrics};

/// Contains several metrics that we're interested in from the cycle loop
#[derive(Clone, Debug)]
pub struct OracleMetricsValue {
    /// The last finalized slot observed
    pub last_finalized_slot: Box<dyn Gauge>,
    /// The current frame index
    pub current_frame: Box<dyn Gauge>,
    /// Number of cycles run
    pub cycles_run: Box<dyn Counter>,
    /// Number of cycles that ended in a recoverable error
    pub cycle_errors: Box<dyn Counter>,
    /// Duration of each cycle in seconds
    pub cycle_duration: Box<dyn Histogram>,
    /// Number of transactions handed to the sender
    pub transactions_submitted: Box<dyn Counter>,
    /// Number of frames whose deadline passed without completion
    pub frames_missed: Box<dyn Counter>,
    /// Whether bunker mode was active in the last cycle (0 or 1)
    pub bunker_mode_active: Box<dyn Gauge>,
}

impl OracleMetricsValue {
    /// Create a new instance of this [`OracleMetricsValue`] struct, setting all the counters and gauges
    #[must_use]
    pub fn new(metrics: &dyn Metrics) -> Self {
        Self {
            last_finalized_slot: metrics
                .create_gauge(String::from("last_finalized_slot"), Some("slots".into())),
            current_frame: metrics.create_gauge(String::from("current_frame"), None),
            cycles_run: metrics.create_counter(String::from("cycles_run"), None),
            cycle_errors: metrics.create_counter(String::from("cycle_errors"), None),
            cycle_duration: metrics
                .create_histogram(String::from("cycle_duration"), Some("seconds".into())),
            transactions_submitted: metrics
                .create_counter(String::from("transactions_submitted"), None),
            frames_missed: metrics.create_counter(String::from("frames_missed"), None),
            bunker_mode_active: metrics.create_gauge(String::from("bunker_mode_active"), None),
        }
    }
}
