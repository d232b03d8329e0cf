#![no_main]
use libfuzzer_sys::fuzz_target;
use lzma_stream::{DecoderOptions, LzmaDecoder};

fuzz_target!(|data: &[u8]| {
    if data.len() < 9 {
        return;
    }

    // Bytes 0-4: properties, capped to a 1 MiB dictionary to avoid OOM
    let options = DecoderOptions {
        max_dictionary_size: Some(1 << 20),
        ..Default::default()
    };
    let mut decoder = LzmaDecoder::with_options(options);
    if decoder.set_properties(&data[..5]).is_err() {
        return;
    }

    // Bytes 5-8: expected length, capped to 16MB; zero means "until end marker"
    let expected = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) % (16 * 1024 * 1024);
    let expected = if expected == 0 { -1 } else { i64::from(expected) };

    let mut out = Vec::new();
    let _ = decoder.decode(&data[9..], &mut out, expected);
    if expected >= 0 {
        assert!(out.len() as i64 <= expected);
    }
});
