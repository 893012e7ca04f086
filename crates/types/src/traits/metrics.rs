// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! The [`Metrics`] trait is used to collect information from multiple components in the entire system.
//!
//! This trait can be used to spawn the following traits:
//! - [`Counter`]: an ever-increasing value (example usage: cycles run, cycle errors)
//! - [`Gauge`]: a value that stores the latest value, and can go up and down (example usage: last finalized slot)
//! - [`Histogram`]: stores multiple float values based for a graph (example usage: cycle duration)
//!
//! Export wiring (Prometheus or otherwise) lives entirely behind this
//! boundary; the oracle core only ever talks to these traits.

use std::fmt::Debug;

use dyn_clone::DynClone;

/// The metrics type.
pub trait Metrics: Send + Sync + DynClone + Debug {
    /// Create a [`Counter`] with an optional `unit_label`.
    ///
    /// The `unit_label` can be used to indicate what the unit of the value is, e.g. "slots" or "seconds"
    fn create_counter(&self, name: String, unit_label: Option<String>) -> Box<dyn Counter>;

    /// Create a [`Gauge`] with an optional `unit_label`.
    ///
    /// The `unit_label` can be used to indicate what the unit of the value is, e.g. "slots" or "seconds"
    fn create_gauge(&self, name: String, unit_label: Option<String>) -> Box<dyn Gauge>;

    /// Create a [`Histogram`] with an optional `unit_label`.
    ///
    /// The `unit_label` can be used to indicate what the unit of the value is, e.g. "slots" or "seconds"
    fn create_histogram(&self, name: String, unit_label: Option<String>) -> Box<dyn Histogram>;

    /// Create a subgroup with a specified prefix.
    fn subgroup(&self, subgroup_name: String) -> Box<dyn Metrics>;
}

/// Use this if you're not planning to use any metrics. All methods are implemented as a no-op
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMetrics;

impl NoMetrics {
    /// Create a new `Box<dyn Metrics>` with this [`NoMetrics`]
    #[must_use]
    pub fn boxed() -> Box<dyn Metrics> {
        Box::<Self>::default()
    }
}

impl Metrics for NoMetrics {
    fn create_counter(&self, _: String, _: Option<String>) -> Box<dyn Counter> {
        Box::new(NoMetrics)
    }

    fn create_gauge(&self, _: String, _: Option<String>) -> Box<dyn Gauge> {
        Box::new(NoMetrics)
    }

    fn create_histogram(&self, _: String, _: Option<String>) -> Box<dyn Histogram> {
        Box::new(NoMetrics)
    }

    fn subgroup(&self, _: String) -> Box<dyn Metrics> {
        Box::new(NoMetrics)
    }
}

impl Counter for NoMetrics {
    fn add(&self, _: usize) {}
}
impl Gauge for NoMetrics {
    fn set(&self, _: usize) {}
    fn update(&self, _: i64) {}
}
impl Histogram for NoMetrics {
    fn add_point(&self, _: f64) {}
}

/// An ever-incrementing counter.
pub trait Counter: Send + Sync + Debug + DynClone {
    /// Increment the counter by `amount`.
    fn add(&self, amount: usize);
}

/// A gauge that stores the latest value.
pub trait Gauge: Send + Sync + Debug + DynClone {
    /// Overwrite the gauge value.
    fn set(&self, amount: usize);

    /// Shift the gauge value by `delta`.
    fn update(&self, delta: i64);
}

/// A histogram which will record a series of points.
pub trait Histogram: Send + Sync + Debug + DynClone {
    /// Record one observation.
    fn add_point(&self, point: f64);
}

dyn_clone::clone_trait_object!(Metrics);
dyn_clone::clone_trait_object!(Gauge);
dyn_clone::clone_trait_object!(Counter);
dyn_clone::clone_trait_object!(Histogram);

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// One recorded metric event.
    #[derive(Clone, Debug, PartialEq)]
    enum Sample {
        /// A counter was incremented.
        Count(String, usize),
        /// A gauge was set or updated to an absolute value.
        Level(String, i64),
        /// A histogram point was recorded.
        Point(String, f64),
    }

    /// Metrics sink that appends every event to a shared log, prefixing
    /// names with the subgroup path.
    #[derive(Clone, Debug, Default)]
    struct SinkMetrics {
        /// Subgroup path accumulated so far.
        prefix: String,
        /// Every event, in recording order.
        log: Arc<Mutex<Vec<Sample>>>,
        /// Last absolute value this gauge handle saw.
        level: Arc<Mutex<i64>>,
    }

    impl SinkMetrics {
        fn named(&self, name: String) -> Self {
            Self {
                prefix: if self.prefix.is_empty() {
                    name
                } else {
                    format!("{}.{name}", self.prefix)
                },
                log: Arc::clone(&self.log),
                level: Arc::new(Mutex::new(0)),
            }
        }

        fn record(&self, sample: Sample) {
            self.log.lock().expect("sink lock poisoned").push(sample);
        }
    }

    impl Metrics for SinkMetrics {
        fn create_counter(&self, name: String, _unit_label: Option<String>) -> Box<dyn Counter> {
            Box::new(self.named(name))
        }

        fn create_gauge(&self, name: String, _unit_label: Option<String>) -> Box<dyn Gauge> {
            Box::new(self.named(name))
        }

        fn create_histogram(&self, name: String, _unit_label: Option<String>) -> Box<dyn Histogram> {
            Box::new(self.named(name))
        }

        fn subgroup(&self, subgroup_name: String) -> Box<dyn Metrics> {
            Box::new(self.named(subgroup_name))
        }
    }

    impl Counter for SinkMetrics {
        fn add(&self, amount: usize) {
            self.record(Sample::Count(self.prefix.clone(), amount));
        }
    }

    impl Gauge for SinkMetrics {
        fn set(&self, amount: usize) {
            let level = i64::try_from(amount).unwrap_or(i64::MAX);
            *self.level.lock().expect("sink lock poisoned") = level;
            self.record(Sample::Level(self.prefix.clone(), level));
        }
        fn update(&self, delta: i64) {
            let mut level = self.level.lock().expect("sink lock poisoned");
            *level += delta;
            self.record(Sample::Level(self.prefix.clone(), *level));
        }
    }

    impl Histogram for SinkMetrics {
        fn add_point(&self, point: f64) {
            self.record(Sample::Point(self.prefix.clone(), point));
        }
    }

    #[test]
    fn events_carry_subgroup_prefixes() {
        let root = SinkMetrics::default();

        let gauge = root.create_gauge("finalized_slot".to_string(), Some("slots".into()));
        gauge.set(100);
        gauge.update(-3);

        let sub = root.subgroup("accounting".to_string());
        let counter = sub.create_counter("cycles".to_string(), None);
        counter.add(1);
        let histogram = sub.create_histogram("cycle_seconds".to_string(), None);
        histogram.add_point(2.5);

        let log = root.log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                Sample::Level("finalized_slot".into(), 100),
                Sample::Level("finalized_slot".into(), 97),
                Sample::Count("accounting.cycles".into(), 1),
                Sample::Point("accounting.cycle_seconds".into(), 2.5),
            ]
        );
    }

    #[test]
    fn boxed_handles_clone_into_the_same_sink() {
        let root = SinkMetrics::default();
        let counter = root.create_counter("transactions".to_string(), None);
        let cloned = counter.clone();

        counter.add(1);
        cloned.add(2);
        assert_eq!(root.log.lock().unwrap().len(), 2);
    }
}
