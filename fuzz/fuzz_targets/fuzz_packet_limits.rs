#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_agent::config::DurationAggregationKind;
use statsd_agent::registry::Registry;
use statsd_agent::wire::{LineParser, TableParser};

// Treats arbitrary bytes as a whole UDP datagram and replays the
// parser-task's own line-splitting (spec §4.3: split on `\n`, parse each
// line independently) over it, submitting every parsed line into a fresh
// registry. Exercises datagrams far past any realistic
// `max_udp_packet_size`, including ones with no newlines at all and ones
// that are all newlines.
fuzz_target!(|data: &[u8]| {
    let Ok(datagram) = std::str::from_utf8(data) else {
        return;
    };

    let parser = TableParser::new();
    let registry = Registry::new(DurationAggregationKind::Hdr);

    for line in datagram.split('\n') {
        if line.is_empty() {
            continue;
        }
        if let Ok(sample) = parser.parse_line(line) {
            let _ = registry.submit(&sample);
        }
    }

    let _ = registry.snapshot_generation();
});
