#![no_main]

use flowproc::flow::document::{self, Format};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for format in [Format::Json, Format::Yaml] {
        if let Ok(flow) = document::parse(text, format) {
            // anything that loads must render and load again
            let rendered = document::render(&flow, format).expect("render");
            document::parse(&rendered, format).expect("reparse");
        }
    }
});
