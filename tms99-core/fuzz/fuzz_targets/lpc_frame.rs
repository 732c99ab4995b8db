#![no_main]

use libfuzzer_sys::fuzz_target;

use tms99_core::io::BitReaderRtl;
use tms99_core::lpc::LpcFrame;

fuzz_target!(|data: Vec<u8>| {
    let mut reader = BitReaderRtl::new(&data);
    while let Ok(Some(_frame)) = LpcFrame::read(&mut reader) {}
});
