use std::collections::BTreeMap;
use std::time::Duration;

/// A set of growth measurements keyed by elapsed time.
///
/// Measurements are expected in log2[area] units. Each elapsed time appears at
/// most once; inserting at an existing time replaces the previous value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthSeries {
    points: BTreeMap<Duration, f64>,
}

impl GrowthSeries {
    /// Create a new empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from `(elapsed seconds, measurement)` pairs.
    ///
    /// Negative or non-finite times are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use colony_growth::GrowthSeries;
    ///
    /// let series = GrowthSeries::from_seconds(&[(7200.0, 3.5), (0.0, 1.0), (3600.0, 2.0)]);
    /// assert_eq!(series.timestamps(), vec![0.0, 3600.0, 7200.0]);
    /// assert_eq!(series.measurements(), vec![1.0, 2.0, 3.5]);
    /// ```
    pub fn from_seconds(points: &[(f64, f64)]) -> Self {
        points
            .iter()
            .filter_map(|&(secs, value)| {
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .map(|elapsed| (elapsed, value))
            })
            .collect()
    }

    /// Add a measurement, returning the value previously recorded at that time.
    pub fn insert(&mut self, elapsed: Duration, measurement: f64) -> Option<f64> {
        self.points.insert(elapsed, measurement)
    }

    /// Number of measurements.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over measurements in time order.
    pub fn iter(&self) -> impl Iterator<Item = (Duration, f64)> + '_ {
        self.points.iter().map(|(t, v)| (*t, *v))
    }

    /// Elapsed times in seconds, sorted ascending.
    pub fn timestamps(&self) -> Vec<f64> {
        self.points.keys().map(Duration::as_secs_f64).collect()
    }

    /// Measurements ordered by elapsed time.
    pub fn measurements(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }
}

impl FromIterator<(Duration, f64)> for GrowthSeries {
    fn from_iter<I: IntoIterator<Item = (Duration, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Duration, f64)> for GrowthSeries {
    fn extend<I: IntoIterator<Item = (Duration, f64)>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

/// Anything that can supply a growth series for curve fitting.
///
/// Colony trackers implement this to hand their area measurements to
/// [`GrowthCurve`](crate::analysis::GrowthCurve).
pub trait GrowthSource {
    fn growth_curve_data(&self) -> GrowthSeries;
}

impl GrowthSource for GrowthSeries {
    fn growth_curve_data(&self) -> GrowthSeries {
        self.clone()
    }
}

impl<T: GrowthSource + ?Sized> GrowthSource for &T {
    fn growth_curve_data(&self) -> GrowthSeries {
        (**self).growth_curve_data()
    }
}
