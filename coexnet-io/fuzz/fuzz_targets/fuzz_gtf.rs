#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = coexnet_io::parse_gtf_reader(data, "fuzz.gtf");
});
