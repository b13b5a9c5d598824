#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;

use colony_growth::{analysis::estimate_parameters, GrowthCurve, GrowthSeries};

fuzz_target!(|data: &[u8]| {
    let series: GrowthSeries = data
        .chunks_exact(10)
        .filter_map(|chunk| {
            let secs = u16::from_le_bytes([chunk[0], chunk[1]]);
            let value = f64::from_le_bytes(chunk[2..10].try_into().ok()?);
            value
                .is_finite()
                .then(|| (Duration::from_secs(u64::from(secs) * 60), value))
        })
        .collect();

    let _ = estimate_parameters(&series.timestamps(), &series.measurements(), 10);

    let mut curve = GrowthCurve::new(series);
    let fitted = curve.parameters();
    let _ = fitted.lag_time();
    let _ = fitted.doubling_time();
});
