#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_agent::config::DurationAggregationKind;
use statsd_agent::registry::Registry;
use statsd_agent::wire::{LineParser, StateMachineParser};

// Feeds arbitrary bytes as the value token of an otherwise well-formed line,
// across all three types, and submits whatever parses into a fresh registry.
// Neither the parser nor the registry's value engines may panic, no matter
// how pathological the numeric text is.
fuzz_target!(|data: &[u8]| {
    let Ok(value_raw) = std::str::from_utf8(data) else {
        return;
    };
    if value_raw.contains(['\n', '|']) {
        return;
    }

    let parser = StateMachineParser::new();
    let registry = Registry::new(DurationAggregationKind::Exact);

    for ty in ["c", "g", "ms"] {
        let line = format!("example:{value_raw}|{ty}");
        if let Ok(sample) = parser.parse_line(&line) {
            assert!(sample.value.is_finite());
            let _ = registry.submit(&sample);
        }
    }
});
