//! Process-wide metric registry and text exposition.
//!
//! Families are declared once at startup with a fixed label schema; after that
//! every write is a keyed lookup into a `DashMap`. Rendering walks families in
//! registration order and series in label order, so two scrapes of the same
//! state produce identical text.
//!
//! Counters and gauges are single atomics. A histogram series keeps its
//! buckets, sum and count behind one mutex so a scrape never sees an
//! observation half applied.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use dashmap::DashMap;

use loadlab_core::error::{LoadLabError, Result};

/// Default latency buckets in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Content type of the rendered snapshot.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

type LabelKey = Vec<String>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

fn valid_name(name: &str, allow_colon: bool) -> bool {
    let extra_ok = |c: char| c == '_' || (allow_colon && c == ':');
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || extra_ok(c));
    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || extra_ok(c))
}

/// Name, help and label schema of one family.
#[derive(Debug, Clone)]
pub struct Desc {
    name: String,
    help: String,
    labels: Vec<&'static str>,
}

impl Desc {
    fn new(name: &str, help: &str, labels: &[&'static str]) -> Result<Self> {
        if !valid_name(name, true) {
            return Err(LoadLabError::Registration(format!("invalid metric name: {name:?}")));
        }
        for (i, l) in labels.iter().enumerate() {
            if !valid_name(l, false) || l.starts_with("__") {
                return Err(LoadLabError::Registration(format!(
                    "{name}: invalid label name {l:?}"
                )));
            }
            if labels[..i].contains(l) {
                return Err(LoadLabError::Registration(format!(
                    "{name}: duplicate label name {l:?}"
                )));
            }
        }
        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the series key; `None` when the value count does not match the schema.
    fn key(&self, values: &[&str]) -> Option<LabelKey> {
        if values.len() != self.labels.len() {
            tracing::error!(
                metric = %self.name,
                expected = self.labels.len(),
                got = values.len(),
                "label cardinality mismatch; write dropped"
            );
            return None;
        }
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    fn label_str(&self, key: &[String]) -> String {
        self.labels
            .iter()
            .zip(key)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn header(&self, kind: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, escape_help(&self.help));
        let _ = writeln!(out, "# TYPE {} {}", self.name, kind);
    }
}

fn write_line(out: &mut String, name: &str, labels: &str, value: &str) {
    if labels.is_empty() {
        let _ = writeln!(out, "{} {}", name, value);
    } else {
        let _ = writeln!(out, "{}{{{}}} {}", name, labels, value);
    }
}

pub struct CounterVec {
    desc: Desc,
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    fn new(desc: Desc) -> Self {
        let map = DashMap::new();
        if desc.labels.is_empty() {
            map.insert(Vec::new(), AtomicU64::new(0));
        }
        Self { desc, map }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[&str]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[&str], v: u64) {
        let Some(key) = self.desc.key(labels) else { return };
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value; 0 for a label set never written.
    pub fn get(&self, labels: &[&str]) -> u64 {
        self.desc
            .key(labels)
            .and_then(|k| self.map.get(&k).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    fn render(&self, out: &mut String) {
        self.desc.header("counter", out);
        let mut rows: Vec<(LabelKey, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            write_line(out, &self.desc.name, &self.desc.label_str(&key), &val.to_string());
        }
    }
}

/// Gauge value stored as `f64` bits.
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, delta: f64) {
        let _ = self.0.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f64::from_bits(bits) + delta).to_bits())
        });
    }
}

pub struct GaugeVec {
    desc: Desc,
    map: DashMap<LabelKey, AtomicF64>,
}

impl GaugeVec {
    fn new(desc: Desc) -> Self {
        let map = DashMap::new();
        if desc.labels.is_empty() {
            map.insert(Vec::new(), AtomicF64::new(0.0));
        }
        Self { desc, map }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[&str]) { self.add(labels, 1.0); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[&str]) { self.add(labels, -1.0); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[&str], v: f64) {
        let Some(key) = self.desc.key(labels) else { return };
        let gauge = self.map.entry(key).or_insert_with(|| AtomicF64::new(0.0));
        gauge.add(v);
    }

    /// Overwrite the current value.
    pub fn set(&self, labels: &[&str], v: f64) {
        let Some(key) = self.desc.key(labels) else { return };
        let gauge = self.map.entry(key).or_insert_with(|| AtomicF64::new(0.0));
        gauge.store(v);
    }

    pub fn get(&self, labels: &[&str]) -> f64 {
        self.desc
            .key(labels)
            .and_then(|k| self.map.get(&k).map(|g| g.load()))
            .unwrap_or(0.0)
    }

    fn render(&self, out: &mut String) {
        self.desc.header("gauge", out);
        let mut rows: Vec<(LabelKey, f64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, val) in rows {
            write_line(out, &self.desc.name, &self.desc.label_str(&key), &fmt_value(val));
        }
    }
}

#[derive(Clone)]
struct HistogramState {
    /// Cumulative: bucket `i` counts observations `<= bounds[i]`.
    buckets: Vec<u64>,
    sum: f64,
    count: u64,
}

pub struct HistogramVec {
    desc: Desc,
    bounds: Vec<f64>,
    map: DashMap<LabelKey, Mutex<HistogramState>>,
}

impl HistogramVec {
    fn new(desc: Desc, bounds: Vec<f64>) -> Self {
        let h = Self { desc, bounds, map: DashMap::new() };
        if h.desc.labels.is_empty() {
            h.map.insert(Vec::new(), Mutex::new(h.empty_state()));
        }
        h
    }

    fn empty_state(&self) -> HistogramState {
        HistogramState { buckets: vec![0; self.bounds.len()], sum: 0.0, count: 0 }
    }

    /// Record one observation.
    pub fn observe(&self, labels: &[&str], v: f64) {
        let Some(key) = self.desc.key(labels) else { return };
        let series = self.map.entry(key).or_insert_with(|| Mutex::new(self.empty_state()));
        let mut st = series.lock().unwrap_or_else(|e| e.into_inner());
        st.count += 1;
        st.sum += v;
        for (i, &b) in self.bounds.iter().enumerate() {
            if v <= b {
                st.buckets[i] += 1;
            }
        }
    }

    /// Record a duration in seconds.
    pub fn observe_duration(&self, labels: &[&str], d: Duration) {
        self.observe(labels, d.as_secs_f64());
    }

    /// Number of observations for a label set.
    pub fn count(&self, labels: &[&str]) -> u64 {
        self.desc
            .key(labels)
            .and_then(|k| {
                self.map.get(&k).map(|s| {
                    let st = s.lock().unwrap_or_else(|e| e.into_inner());
                    st.count
                })
            })
            .unwrap_or(0)
    }

    fn render(&self, out: &mut String) {
        self.desc.header("histogram", out);
        let mut rows: Vec<(LabelKey, HistogramState)> = self
            .map
            .iter()
            .map(|r| {
                let st = r.value().lock().unwrap_or_else(|e| e.into_inner()).clone();
                (r.key().clone(), st)
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let name = &self.desc.name;
        for (key, st) in rows {
            let label_str = self.desc.label_str(&key);
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{},", label_str)
            };
            for (le, count) in self.bounds.iter().zip(&st.buckets) {
                let le = fmt_value(*le);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, st.count);
            write_line(out, &format!("{name}_sum"), &label_str, &fmt_value(st.sum));
            write_line(out, &format!("{name}_count"), &label_str, &st.count.to_string());
        }
    }
}

enum Family {
    Counter(Arc<CounterVec>),
    Gauge(Arc<GaugeVec>),
    Histogram(Arc<HistogramVec>),
}

impl Family {
    fn name(&self) -> &str {
        match self {
            Family::Counter(c) => c.desc.name(),
            Family::Gauge(g) => g.desc.name(),
            Family::Histogram(h) => h.desc.name(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Family::Counter(c) => c.render(out),
            Family::Gauge(g) => g.render(out),
            Family::Histogram(h) => h.render(out),
        }
    }
}

/// Owner of every metric family in the process.
#[derive(Default)]
pub struct Registry {
    families: RwLock<Vec<Family>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(
        &self,
        name: &str,
        help: &str,
        labels: &[&'static str],
    ) -> Result<Arc<CounterVec>> {
        let c = Arc::new(CounterVec::new(Desc::new(name, help, labels)?));
        self.register(Family::Counter(Arc::clone(&c)))?;
        Ok(c)
    }

    pub fn gauge(&self, name: &str, help: &str, labels: &[&'static str]) -> Result<Arc<GaugeVec>> {
        let g = Arc::new(GaugeVec::new(Desc::new(name, help, labels)?));
        self.register(Family::Gauge(Arc::clone(&g)))?;
        Ok(g)
    }

    pub fn histogram(
        &self,
        name: &str,
        help: &str,
        labels: &[&'static str],
        buckets: &[f64],
    ) -> Result<Arc<HistogramVec>> {
        let desc = Desc::new(name, help, labels)?;
        if labels.contains(&"le") {
            return Err(LoadLabError::Registration(format!("{name}: label \"le\" is reserved")));
        }
        if buckets.is_empty()
            || buckets.iter().any(|b| !b.is_finite())
            || buckets.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(LoadLabError::Registration(format!(
                "{name}: buckets must be finite and strictly increasing"
            )));
        }
        let h = Arc::new(HistogramVec::new(desc, buckets.to_vec()));
        self.register(Family::Histogram(Arc::clone(&h)))?;
        Ok(h)
    }

    fn register(&self, family: Family) -> Result<()> {
        let mut families = self
            .families
            .write()
            .map_err(|_| LoadLabError::Internal("metric registry lock poisoned".into()))?;
        if families.iter().any(|f| f.name() == family.name()) {
            return Err(LoadLabError::Registration(format!(
                "metric family already registered: {}",
                family.name()
            )));
        }
        families.push(family);
        Ok(())
    }

    /// Render every family in text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let families = self.families.read().unwrap_or_else(|e| e.into_inner());
        for f in families.iter() {
            f.render(&mut out);
        }
        out
    }
}
