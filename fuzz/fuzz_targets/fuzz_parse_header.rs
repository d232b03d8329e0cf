#![no_main]
use libfuzzer_sys::fuzz_target;
use lzma_stream::AloneHeader;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = AloneHeader::parse(data) {
        // Whatever parses must serialize back to the same 13 bytes.
        assert_eq!(&header.to_bytes()[..], &data[..AloneHeader::HEADER_SIZE]);
    }
});
