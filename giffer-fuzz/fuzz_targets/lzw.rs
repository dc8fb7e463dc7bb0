// cargo fuzz run lzw corpus/lzw -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use giffer::lzw;

fuzz_target!(|data: &[u8]| {
    let Some((&bits, pixels)) = data.split_first() else {
        return;
    };
    let min_code_size = 2 + bits % 7;
    let mask = ((1u16 << min_code_size) - 1) as u8;
    let pixels: Vec<u8> = pixels.iter().map(|p| p & mask).collect();
    let compressed = lzw::compress(&pixels, min_code_size).unwrap();
    assert_eq!(lzw::decompress(&compressed).unwrap(), pixels);
    // arbitrary input must not panic
    let _ = lzw::decompress(data);
});
