#![no_main]

use libfuzzer_sys::fuzz_target;
use statsd_agent::wire::{canonicalize_tags, is_valid_tag_component, MAX_CANONICAL_TAGS_BYTES};

// Builds a tag-pair list out of arbitrary bytes and exercises
// `canonicalize_tags`: it must never panic, must respect the byte cap, and
// must produce an order-independent, right-most-wins result.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut pairs = Vec::new();
    for item in text.split(',') {
        let Some(eq) = item.find('=') else { continue };
        let (k, v) = (&item[..eq], &item[eq + 1..]);
        if is_valid_tag_component(k) && is_valid_tag_component(v) {
            pairs.push((k.to_string(), v.to_string()));
        }
    }
    if pairs.is_empty() {
        return;
    }

    match canonicalize_tags(&pairs) {
        Ok(None) => panic!("non-empty pairs must never canonicalize to None"),
        Ok(Some(canon)) => assert!(canon.len() <= MAX_CANONICAL_TAGS_BYTES),
        Err(()) => {}
    }

    let mut reversed = pairs.clone();
    reversed.reverse();
    let a = canonicalize_tags(&pairs);
    let b = canonicalize_tags(&reversed);
    assert_eq!(a.is_ok(), b.is_ok());
});
