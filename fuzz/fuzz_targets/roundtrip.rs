#![no_main]
use libfuzzer_sys::fuzz_target;
use xosc::EncodeOptions;

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(decoded) = xosc::decode(xml) else {
        return;
    };
    let options = EncodeOptions::default().with_timestamp(chrono::NaiveDateTime::default());
    // Nicht importierte Storyboard-Referenzen duerfen den Export scheitern lassen.
    let Ok(out) = xosc::encode_with_options(&decoded.document, &decoded.parameters, &options) else {
        return;
    };
    let again = xosc::decode(&out).expect("exported document must import");
    let out2 = xosc::encode_with_options(&again.document, &again.parameters, &options)
        .expect("re-import must export");
    assert_eq!(out, out2);
});
