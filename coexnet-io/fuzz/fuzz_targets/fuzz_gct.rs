#![no_main]
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let _ = coexnet_io::read_gct_reader(data, Path::new("fuzz.gct"));
});
