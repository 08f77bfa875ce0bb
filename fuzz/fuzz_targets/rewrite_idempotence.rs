#![no_main]

use authstrip_edit::rewrite_content;
use authstrip_rules::{AccessPolicy, Detector};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else { return };
    let Ok(registry) = AccessPolicy::permissive().registry() else { return };
    let detector = Detector::new(&registry);

    let once = rewrite_content(src, &detector.detect(src), &registry);
    let twice = rewrite_content(&once.content, &detector.detect(&once.content), &registry);

    assert_eq!(once.content, twice.content, "second pass changed content");
    assert!(!twice.marker_inserted);
});
