#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|samples: Vec<f64>| {
    if let Ok(summary) = benchsweep_domain::summarize_samples(&samples) {
        assert!(summary.variance >= 0.0 || summary.variance.is_nan());
        assert!(summary.stdev >= 0.0 || summary.stdev.is_nan());
    }
});
