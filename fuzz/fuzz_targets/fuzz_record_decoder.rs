//! Fuzz target: inventory record decoder
//!
//! Feeds arbitrary text to `record::decode` and checks:
//! - No panics under arbitrary input
//! - A decoded inventory never exceeds its drawer count
//! - Anything that decodes re-encodes to a record that decodes to the same store
//!
//! cargo fuzz run fuzz_record_decoder

#![no_main]

use filterunit::inventory::record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&capacity, rest)) = data.split_first() else {
        return;
    };
    let capacity = capacity % 33;
    let Ok(text) = core::str::from_utf8(rest) else {
        return;
    };

    let Ok(inventory) = record::decode(text, capacity) else {
        return;
    };
    assert!(inventory.filter_count() <= capacity as usize);
    assert!(inventory.combinations().iter().filter(|c| c.placed).count() <= 1);

    let again = record::decode(&record::encode(&inventory), capacity)
        .expect("re-encoded record must decode");
    assert_eq!(again.filters(), inventory.filters());
    assert_eq!(again.combinations(), inventory.combinations());
});
