#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(node) = jtree::parse_str(s) {
            let mut value = jtree::Value::Null;
            let _ = node.decode(&mut value);
        }
    }
});
