#![no_main]

use libfuzzer_sys::fuzz_target;
use webdav_request_core::{join_url, join_url_parts};

const MAX_PARTS: usize = 16;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // NUL separates parts so any other character can appear inside one
    let parts: Vec<&str> = text.split('\0').take(MAX_PARTS).collect();
    let joined = join_url(&parts);
    let _ = join_url_parts(&parts);

    if !joined.contains('?') {
        return;
    }
    assert_eq!(
        joined.matches('?').count(),
        1,
        "query marks were not merged: {joined}"
    );
});
