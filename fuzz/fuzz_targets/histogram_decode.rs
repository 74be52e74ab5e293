#![no_main]

use fifostat::stats::{CdfBuilder, CdfPolicy, Histogram};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed blobs must come back as errors, never panics
        if let Ok(histogram) = Histogram::decode(input) {
            let points = CdfBuilder::new(CdfPolicy::thinned(0.01)).build(&histogram);
            assert!(points.len() <= 100);
            let full = CdfBuilder::new(CdfPolicy::Full).build(&histogram);
            assert_eq!(full.len(), histogram.buckets().len());
        }
    }
});
