#![no_main]

use authstrip_edit::merge_env;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else { return };
    let updates = vec![
        ("API_URL".to_string(), "https://example.test".to_string()),
        ("EMPTY".to_string(), String::new()),
    ];

    let once = merge_env(src, &updates);
    let twice = merge_env(&once.contents, &updates);

    assert_eq!(once.contents, twice.contents);
    assert!(twice.added.is_empty());
});
