//! Shared estimate for multi-threaded hosts
//!
//! [`share`] splits an estimator into a single [`EstimatorWriter`] that runs
//! the filter and any number of [`EstimateReader`]s that observe it. Readers
//! only ever see complete snapshots taken after an update finished; they
//! never block the writer for longer than a snapshot copy.
//!
//! ```rust
//! use vario_core::{share, AltitudeEstimator, ManualTime, TuningParameters};
//!
//! let clock = ManualTime::new(0);
//! let (mut writer, reader) = share(AltitudeEstimator::new(TuningParameters::default(), clock)?);
//!
//! let id = reader.subscribe(|snapshot| println!("altitude {:.2} m", snapshot.altitude));
//! writer.update_at(10.0, 1000)?;
//! reader.unsubscribe(id);
//!
//! assert_eq!(reader.snapshot().update_count, 1);
//! # Ok::<(), vario_core::EstimatorError>(())
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::{
    errors::EstimatorResult,
    estimator::{AltitudeEstimator, Covariance, UpdateOutcome},
    time::Timestamp,
    traits::{SampleSink, TimeSource},
};

/// Estimate as of the last finished update
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimateSnapshot {
    /// Altitude (m)
    pub altitude: f64,
    /// Vertical speed (m/s)
    pub vertical_speed: f64,
    /// Sensor bias (m)
    pub bias: f64,
    /// State covariance
    pub covariance: Covariance,
    /// Timestamp of the last cycle, `None` before the first one
    pub last_update: Option<Timestamp>,
    /// Measurements accepted so far
    pub update_count: u64,
}

impl EstimateSnapshot {
    fn capture<C: TimeSource>(estimator: &AltitudeEstimator<C>) -> Self {
        let state = estimator.state();
        Self {
            altitude: state.altitude,
            vertical_speed: state.vertical_speed,
            bias: state.bias,
            covariance: state.covariance,
            last_update: state.last_update,
            update_count: estimator.update_count(),
        }
    }
}

/// Handle returned by [`EstimateReader::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&EstimateSnapshot) + Send>;

struct Shared {
    snapshot: RwLock<EstimateSnapshot>,
    observers: Mutex<Observers>,
}

struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Observer)>,
    /// Ids of entries taken out for a notification round
    notifying: Vec<SubscriptionId>,
    /// Ids unsubscribed while their entry was taken out
    removed: Vec<SubscriptionId>,
}

impl Observers {
    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        if self.entries.len() != before {
            return true;
        }

        if self.notifying.contains(&id) && !self.removed.contains(&id) {
            self.removed.push(id);
            return true;
        }
        false
    }

    fn len(&self) -> usize {
        self.entries.len() + self.notifying.len() - self.removed.len()
    }
}

/// Split an estimator into its writer and a first reader
pub fn share<C: TimeSource>(estimator: AltitudeEstimator<C>) -> (EstimatorWriter<C>, EstimateReader) {
    let shared = Arc::new(Shared {
        snapshot: RwLock::new(EstimateSnapshot::capture(&estimator)),
        observers: Mutex::new(Observers {
            next_id: 0,
            entries: Vec::new(),
            notifying: Vec::new(),
            removed: Vec::new(),
        }),
    });

    let reader = EstimateReader {
        shared: Arc::clone(&shared),
    };
    (EstimatorWriter { estimator, shared }, reader)
}

/// Exclusive owner of a shared estimator
///
/// Not `Clone`: exactly one writer exists per estimator, so updates are
/// serialized by ownership rather than by a lock.
pub struct EstimatorWriter<C: TimeSource> {
    estimator: AltitudeEstimator<C>,
    shared: Arc<Shared>,
}

impl<C: TimeSource> EstimatorWriter<C> {
    /// Update with the estimator's clock, then publish
    pub fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome> {
        let outcome = self.estimator.update(measurement)?;
        self.publish();
        Ok(outcome)
    }

    /// Update for a reading taken at `timestamp`, then publish
    pub fn update_at(&mut self, measurement: f64, timestamp: Timestamp) -> EstimatorResult<UpdateOutcome> {
        let outcome = self.estimator.update_at(measurement, timestamp)?;
        self.publish();
        Ok(outcome)
    }

    /// Time update only, then publish
    pub fn predict(&mut self) -> f64 {
        let dt = self.estimator.predict();
        self.publish();
        dt
    }

    /// The wrapped estimator
    pub fn estimator(&self) -> &AltitudeEstimator<C> {
        &self.estimator
    }

    /// A new reader on this estimate
    pub fn reader(&self) -> EstimateReader {
        EstimateReader {
            shared: Arc::clone(&self.shared),
        }
    }

    fn publish(&mut self) {
        let snapshot = EstimateSnapshot::capture(&self.estimator);
        *self
            .shared
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;

        // Observers run with no lock held so they may use any reader,
        // including unsubscribing themselves.
        let mut running = {
            let mut observers = self.shared.lock_observers();
            let running = core::mem::take(&mut observers.entries);
            observers.notifying = running.iter().map(|(id, _)| *id).collect();
            running
        };

        for (id, observer) in running.iter_mut() {
            if !self.shared.lock_observers().removed.contains(id) {
                observer(&snapshot);
            }
        }

        let mut observers = self.shared.lock_observers();
        let removed = core::mem::take(&mut observers.removed);
        observers.notifying.clear();
        running.retain(|(id, _)| !removed.contains(id));

        // Subscribed during the round, so they go after the existing ones
        let added = core::mem::replace(&mut observers.entries, running);
        observers.entries.extend(added);
    }
}

impl<C: TimeSource> SampleSink for EstimatorWriter<C> {
    fn update(&mut self, measurement: f64) -> EstimatorResult<UpdateOutcome> {
        EstimatorWriter::update(self, measurement)
    }

    fn update_at(&mut self, measurement: f64, timestamp: Timestamp) -> EstimatorResult<UpdateOutcome> {
        EstimatorWriter::update_at(self, measurement, timestamp)
    }
}

impl Shared {
    fn lock_observers(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only view of a shared estimate
#[derive(Clone)]
pub struct EstimateReader {
    shared: Arc<Shared>,
}

impl EstimateReader {
    /// Latest published snapshot
    pub fn snapshot(&self) -> EstimateSnapshot {
        *self
            .shared
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest altitude (m)
    pub fn altitude(&self) -> f64 {
        self.snapshot().altitude
    }

    /// Latest vertical speed (m/s)
    pub fn vertical_speed(&self) -> f64 {
        self.snapshot().vertical_speed
    }

    /// Call `observer` with every snapshot published from now on
    ///
    /// Observers run on the writer's thread after each update, in
    /// subscription order. A callback may use any reader, itself included;
    /// observers it subscribes are first called on the next update.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: FnMut(&EstimateSnapshot) + Send + 'static,
    {
        let mut observers = self.shared.lock_observers();
        let id = SubscriptionId(observers.next_id);
        observers.next_id += 1;
        observers.entries.push((id, Box::new(observer)));
        id
    }

    /// Stop notifying an observer; returns false if it was already gone
    ///
    /// Takes effect immediately, even from inside a running callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.lock_observers().remove(id)
    }

    /// Number of registered observers
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock_observers().len()
    }
}

impl core::fmt::Debug for EstimateReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EstimateReader")
            .field("snapshot", &self.snapshot())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{estimator::TuningParameters, time::ManualTime};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn shared() -> (EstimatorWriter<ManualTime>, EstimateReader) {
        let estimator = AltitudeEstimator::new(TuningParameters::default(), ManualTime::new(0)).unwrap();
        share(estimator)
    }

    #[test]
    fn reader_starts_at_initial_state() {
        let (_writer, reader) = shared();
        let snapshot = reader.snapshot();

        assert_eq!(snapshot.altitude, 0.0);
        assert_eq!(snapshot.last_update, None);
        assert_eq!(snapshot.update_count, 0);
        assert_eq!(snapshot.covariance, Covariance::default());
    }

    #[test]
    fn snapshot_follows_writer() {
        let (mut writer, reader) = shared();
        writer.update_at(10.0, 1000).unwrap();
        writer.update_at(10.1, 2000).unwrap();

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.update_count, 2);
        assert_eq!(snapshot.last_update, Some(2000));
        assert_eq!(snapshot.altitude, writer.estimator().altitude());
        assert_eq!(reader.vertical_speed(), writer.estimator().vertical_speed());
    }

    #[test]
    fn rejected_measurement_publishes_nothing() {
        let (mut writer, reader) = shared();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        reader.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(writer.update_at(f64::INFINITY, 1000).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(reader.snapshot().update_count, 0);
    }

    #[test]
    fn observers_see_each_update_until_unsubscribed() {
        let (mut writer, reader) = shared();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = reader.subscribe(move |snapshot| {
            assert!(snapshot.altitude.is_finite());
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(reader.subscriber_count(), 1);

        writer.update_at(5.0, 1000).unwrap();
        writer.update_at(5.5, 2000).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(reader.unsubscribe(id));
        assert!(!reader.unsubscribe(id));
        writer.update_at(6.0, 3000).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn observer_can_unsubscribe_itself() {
        let (mut writer, reader) = shared();
        let count = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let seen = Arc::clone(&count);
        let id_slot = Arc::clone(&own_id);
        let handle = reader.clone();
        let id = reader.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *id_slot.lock().unwrap() {
                assert!(handle.unsubscribe(id));
            }
        });
        *own_id.lock().unwrap() = Some(id);

        writer.update_at(5.0, 1000).unwrap();
        assert_eq!(reader.subscriber_count(), 0);
        assert!(!reader.unsubscribe(id));

        writer.update_at(5.5, 2000).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_can_inspect_and_extend_subscriptions() {
        let (mut writer, reader) = shared();
        let later = Arc::new(AtomicUsize::new(0));
        let printed = Arc::new(Mutex::new(String::new()));

        let handle = reader.clone();
        let later_calls = Arc::clone(&later);
        let text = Arc::clone(&printed);
        reader.subscribe(move |snapshot| {
            *text.lock().unwrap() = format!("{:?}", handle);
            if snapshot.update_count == 1 {
                let calls = Arc::clone(&later_calls);
                handle.subscribe(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                });
                assert_eq!(handle.subscriber_count(), 2);
            }
        });

        writer.update_at(5.0, 1000).unwrap();
        assert!(printed.lock().unwrap().contains("subscribers: 1"));
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(reader.subscriber_count(), 2);

        writer.update_at(5.5, 2000).unwrap();
        assert_eq!(later.load(Ordering::SeqCst), 1);
        assert!(printed.lock().unwrap().contains("subscribers: 2"));
    }

    #[test]
    fn observer_can_unsubscribe_a_later_one() {
        let (mut writer, reader) = shared();
        let count = Arc::new(AtomicUsize::new(0));
        let target = Arc::new(Mutex::new(None));

        let handle = reader.clone();
        let slot = Arc::clone(&target);
        reader.subscribe(move |_| {
            if let Some(id) = slot.lock().unwrap().take() {
                handle.unsubscribe(id);
            }
        });
        let seen = Arc::clone(&count);
        let id = reader.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        *target.lock().unwrap() = Some(id);

        writer.update_at(5.0, 1000).unwrap();
        writer.update_at(5.5, 2000).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(reader.subscriber_count(), 1);
    }

    #[test]
    fn readers_on_other_threads() {
        let (mut writer, reader) = shared();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = reader.clone();
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..200 {
                        let snapshot = reader.snapshot();
                        assert!(snapshot.update_count >= last);
                        assert!(snapshot.covariance.is_symmetric(1e-9));
                        last = snapshot.update_count;
                    }
                })
            })
            .collect();

        for i in 1..=200u64 {
            writer.update_at(10.0 + (i % 3) as f64 * 0.05, i * 100).unwrap();
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(reader.snapshot().update_count, 200);
    }
}
