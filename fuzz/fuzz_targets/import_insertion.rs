#![no_main]

use authstrip_edit::{insert_after_last_import, last_import_end};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else { return };
    let lines = vec!["# marker".to_string()];

    match (last_import_end(src), insert_after_last_import(src, &lines)) {
        (Some(end), Some(out)) => {
            assert!(out.starts_with(&src[..end]));
            assert!(out.ends_with(&src[end..]));
            assert!(out.contains("# marker"));
        }
        (None, None) => {}
        other => panic!("insertion disagrees with import detection: {other:?}"),
    }
});
