#![no_main]

use flowproc::flow::markers;
use flowproc::flow::value::Namespace;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for namespace in [Namespace::Variables, Namespace::Storage] {
        let names = markers::extract(namespace, text);
        if let Some(first) = names.first() {
            let replaced = markers::replace(namespace, text, first, "renamed").expect("marker present");
            assert!(markers::extract(namespace, &replaced).contains(&"renamed"));
        }
    }
});
