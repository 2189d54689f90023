#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_agent::wire::{LineParser, StateMachineParser, TableParser};

// The two parser implementations must accept exactly the same language;
// this target hunts for lines on which they disagree.
fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    if line.contains('\0') {
        return;
    }

    let sm = StateMachineParser::new().parse_line(line);
    let tb = TableParser::new().parse_line(line);

    match (sm, tb) {
        (Ok(a), Ok(b)) => {
            assert_eq!(a.name, b.name, "name mismatch on {line:?}");
            assert_eq!(a.kind, b.kind, "kind mismatch on {line:?}");
            assert_eq!(a.value, b.value, "value mismatch on {line:?}");
            assert_eq!(a.sign, b.sign, "sign mismatch on {line:?}");
            assert_eq!(a.tags, b.tags, "tags mismatch on {line:?}");
        }
        (Err(_), Err(_)) => {}
        _ => panic!("parsers disagree on acceptance of {line:?}"),
    }
});
