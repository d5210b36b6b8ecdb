//! Labeled metric families.

use elsa::sync::FrozenMap;
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeMetric, MetricEncoder},
    metrics::{counter::Counter, gauge::Gauge, MetricType, TypedMetric},
};

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{atomic::AtomicU64, Arc},
};

/// Floating-point gauge.
pub type F64Gauge = Gauge<f64, AtomicU64>;
/// Family of counters.
pub type CounterFamily<S> = Family<S, Counter>;
/// Family of floating-point gauges.
pub type GaugeFamily<S> = Family<S, F64Gauge>;

struct FamilyInner<S, M> {
    map: FrozenMap<S, Box<M>>,
    enabled: bool,
}

impl<S, M> FamilyInner<S, M>
where
    S: Clone + Eq + Hash,
    M: Default,
{
    fn get_or_create(&self, labels: &S) -> &M {
        if let Some(metric) = self.map.get(labels) {
            return metric;
        }
        self.map.insert_with(labels.clone(), || Box::default())
    }
}

/// Family of metrics labelled by a label set `S`.
///
/// Unlike the family in `prometheus-client`, obtaining a member never holds a lock, so members
/// can be created while other members are borrowed. A family can be *disabled* (i.e., its metric is denied);
/// updates to a disabled family are ignored and it is never registered.
pub struct Family<S, M>(Arc<FamilyInner<S, M>>);

impl<S, M> fmt::Debug for Family<S, M>
where
    S: fmt::Debug + Clone + Eq + Hash,
    M: fmt::Debug,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map_keys = self.0.map.keys_cloned();
        let map_snapshot: HashMap<_, _> = map_keys
            .iter()
            .filter_map(|key| Some((key, self.0.map.get(key)?)))
            .collect();

        formatter
            .debug_struct("Family")
            .field("enabled", &self.0.enabled)
            .field("map", &map_snapshot)
            .finish()
    }
}

impl<S, M> Clone for Family<S, M> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S: Clone + Eq + Hash, M: Default> Family<S, M> {
    pub(crate) fn new(enabled: bool) -> Self {
        let inner = FamilyInner {
            map: FrozenMap::new(),
            enabled,
        };
        Self(Arc::new(inner))
    }

    /// Checks whether this family accepts updates.
    pub fn is_enabled(&self) -> bool {
        self.0.enabled
    }

    /// Gets a metric with the specified labels if it was reported previously. This is mostly useful
    /// for testing.
    pub fn get(&self, labels: &S) -> Option<&M> {
        self.0.map.get(labels)
    }

    /// Returns the number of label sets reported to this family.
    pub fn len(&self) -> usize {
        self.0.map.keys_cloned().len()
    }

    /// Checks whether nothing was reported to this family yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all metrics currently present in this family together with the corresponding labels.
    /// This is inefficient and mostly useful for testing purposes.
    pub fn to_entries(&self) -> HashMap<S, &M> {
        let labels = self.0.map.keys_cloned();
        labels
            .into_iter()
            .filter_map(|key| {
                let metric = self.0.map.get(&key)?;
                Some((key, metric))
            })
            .collect()
    }

    fn member(&self, labels: &S) -> Option<&M> {
        self.0.enabled.then(|| self.0.get_or_create(labels))
    }
}

impl<S: Clone + Eq + Hash> Family<S, Counter> {
    /// Adds `value` to the counter with the specified labels, creating the counter if necessary.
    /// No-op if the family is disabled.
    pub fn add(&self, labels: &S, value: u64) {
        if let Some(counter) = self.member(labels) {
            counter.inc_by(value);
        }
    }
}

impl<S: Clone + Eq + Hash> Family<S, F64Gauge> {
    /// Sets the gauge with the specified labels, creating the gauge if necessary.
    /// No-op if the family is disabled.
    pub fn set(&self, labels: &S, value: f64) {
        if let Some(gauge) = self.member(labels) {
            gauge.set(value);
        }
    }
}

impl<S, M> EncodeMetric for Family<S, M>
where
    S: Clone + Eq + Hash + EncodeLabelSet,
    M: EncodeMetric + TypedMetric,
{
    fn encode(&self, mut encoder: MetricEncoder<'_>) -> fmt::Result {
        for labels in &self.0.map.keys_cloned() {
            let Some(metric) = self.0.map.get(labels) else {
                continue;
            };
            let encoder = encoder.encode_family(labels)?;
            metric.encode(encoder)?;
        }
        Ok(())
    }

    fn metric_type(&self) -> MetricType {
        <M as TypedMetric>::TYPE
    }
}

impl<S, M: TypedMetric> TypedMetric for Family<S, M> {
    const TYPE: MetricType = <M as TypedMetric>::TYPE;
}
