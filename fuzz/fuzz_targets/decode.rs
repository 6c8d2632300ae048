#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = xosc::decode(xml);
        let _ = xosc::decode_with_options(xml, &xosc::DecodeOptions::default().with_lenient_templates());
    }
});
