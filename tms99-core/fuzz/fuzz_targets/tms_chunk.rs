#![no_main]

use libfuzzer_sys::fuzz_target;

use tms99_compose::read_chunk;

fuzz_target!(|data: Vec<u8>| {
    let mut cursor: &[u8] = &data;
    while let Ok(Some(_chunk)) = read_chunk(&mut cursor) {}
});
