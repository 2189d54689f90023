#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_agent::wire::{is_valid_name, LineParser, StateMachineParser};

// Feeds arbitrary bytes as a metric name and checks `is_valid_name` agrees
// with whatever a full line built around that name does at the parser.
fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    if name.contains(['\n', ':', '|', ',']) {
        return;
    }

    let valid = is_valid_name(name);
    let line = format!("{name}:1|c");
    let parsed = StateMachineParser::new().parse_line(&line);

    if valid {
        let sample = parsed.expect("a valid name must parse");
        assert_eq!(sample.name, name);
    } else {
        assert!(parsed.is_err(), "an invalid name must not parse: {name:?}");
    }
});
