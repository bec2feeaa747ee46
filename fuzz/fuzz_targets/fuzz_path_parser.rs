#![no_main]

use libfuzzer_sys::fuzz_target;
use reflow_store::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let path = Path::parse(text);
        // Normalized form must reparse to the same path.
        assert_eq!(Path::parse(&path.key()), path);
    }
});
