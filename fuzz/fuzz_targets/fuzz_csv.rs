#![no_main]

use libfuzzer_sys::fuzz_target;

use colony_growth::{io, GrowthCurve};

fuzz_target!(|data: &[u8]| {
    if let Ok(series) = io::read_csv_from_bytes(data) {
        let mut curve = GrowthCurve::new(series);
        let _ = curve.summary();
    }
});
