#![no_main]

use flowproc::config::ResolvedConfig;
use flowproc::flow::document::{self, Format};
use flowproc::processor::registry::{Group, ProcessorRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(flow) = document::parse(text, Format::Json) else {
        return;
    };
    let registry = ProcessorRegistry::default_registry();
    let config = ResolvedConfig::default();
    for group in [Group::CleanUp, Group::Check] {
        let mut multi = registry.build_group(group, &config).expect("default group builds");
        let _ = multi.process(&flow);
    }
});
