#![no_main]

use libfuzzer_sys::fuzz_target;
use webdav_request_core::encode_path;

const MAX_INPUT_BYTES: usize = 8 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_BYTES {
        return;
    }
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };

    let encoded = encode_path(path);
    assert!(!encoded.contains("%2F"), "slash was percent-encoded: {encoded}");
    assert!(
        encoded.bytes().all(|b| b.is_ascii_graphic()),
        "encoded path contains raw bytes: {encoded:?}"
    );

    let decoded = urlencoding::decode(&encoded).expect("encoded path should decode as utf8");
    assert_eq!(decoded, path);
});
