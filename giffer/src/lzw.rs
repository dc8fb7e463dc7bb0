// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::ops::AddAssign;

/// Maximum length of a data sub-block
const SUB_BLOCK_MAX: usize = 0xFF;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }

    /// Get the bit mask
    fn mask(self) -> u32 {
        (1 << (self.0 as u32)) - 1
    }
}

/// Code type
type Code = u16;

/// Code dictionary for compression.
///
/// Every string in the dictionary is identified by the code of its prefix
/// plus its final byte, so the map keys stand for whole strings.  One
/// dictionary lives for a single epoch: a clear code replaces it with a
/// fresh one.
#[derive(Debug)]
struct Dictionary {
    /// String to code map
    codes: HashMap<(Code, u8), Code>,
    /// Next available code
    next_code: Code,
}

impl Dictionary {
    /// Create a dictionary holding only single-symbol strings
    fn new(min_code_bits: u8) -> Self {
        let clear_code: Code = 1 << min_code_bits;
        Dictionary {
            codes: HashMap::with_capacity(Bits::MAX.entries().into()),
            // skip clear and end codes
            next_code: clear_code + 2,
        }
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.next_code
    }

    /// Look up the string `prefix + byte`, inserting it when missing.
    ///
    /// Returns `Some(code)` if it was found, `None` if it was inserted.
    fn search_insert(&mut self, prefix: Code, byte: u8) -> Option<Code> {
        match self.codes.get(&(prefix, byte)) {
            Some(code) => Some(*code),
            None => {
                self.codes.insert((prefix, byte), self.next_code);
                self.next_code += 1;
                None
            }
        }
    }
}

/// LZW Data Compressor
pub struct Compressor {
    /// Code dictionary
    dict: Dictionary,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Current code
    code: u32,
    /// Number of bits in current code
    n_bits: u8,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        Compressor {
            dict: Dictionary::new(min_code_bits),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            code: 0,
            n_bits: 0,
        }
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Pack a code into a buffer
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= (code as u32) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Start a new dictionary epoch
    fn reset(&mut self) {
        self.dict = Dictionary::new(self.min_code_bits);
        self.code_bits = Bits::from(self.min_code_bits + 1);
    }

    /// Compress a byte buffer (without sub-block framing)
    pub fn compress(&mut self, bytes: &[u8], buffer: &mut Vec<u8>) {
        self.pack(self.clear_code(), buffer);
        let mut prefix: Option<Code> = None;
        for &byte in bytes {
            let code = match prefix {
                Some(p) => match self.dict.search_insert(p, byte) {
                    Some(code) => code,
                    None => {
                        self.pack(p, buffer);
                        byte as Code
                    }
                },
                None => byte as Code,
            };
            prefix = Some(code);
            let next_code = self.dict.next_code();
            if next_code > self.code_bits.entries() {
                if next_code > Bits::MAX.entries() {
                    trace!("lzw: dictionary full, clearing");
                    self.pack(self.clear_code(), buffer);
                    self.reset();
                } else {
                    self.code_bits += 1;
                }
            }
        }
        if let Some(code) = prefix {
            self.pack(code, buffer);
            // decoder adds an entry for the final code as well
            if self.dict.next_code() == self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        self.pack(self.end_code(), buffer);
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
            self.code = 0;
            self.n_bits = 0;
        }
    }
}

/// Compress indexed pixels into a GIF image data stream.
///
/// The result starts with `min_code_size`, followed by the compressed codes
/// in sub-blocks of at most 255 bytes, and ends with a zero-length block
/// terminator.  Every pixel must be less than `2^min_code_size`.
pub fn compress(pixels: &[u8], min_code_size: u8) -> Result<Vec<u8>> {
    if !(2..=8).contains(&min_code_size) {
        return Err(Error::InvalidCodeSize);
    }
    let limit = 1u16 << min_code_size;
    if pixels.iter().any(|p| u16::from(*p) >= limit) {
        return Err(Error::InvalidColorIndex);
    }
    let mut codes = Vec::with_capacity(pixels.len() / 2 + 16);
    Compressor::new(min_code_size).compress(pixels, &mut codes);
    Ok(frame_sub_blocks(min_code_size, &codes))
}

/// Frame compressed codes into data sub-blocks
fn frame_sub_blocks(min_code_size: u8, codes: &[u8]) -> Vec<u8> {
    let n_blocks = codes.len().div_ceil(SUB_BLOCK_MAX);
    let mut data = Vec::with_capacity(codes.len() + n_blocks + 2);
    data.push(min_code_size);
    for chunk in codes.chunks(SUB_BLOCK_MAX) {
        data.push(chunk.len() as u8); // block size
        data.extend_from_slice(chunk);
    }
    data.push(0); // block terminator
    data
}

/// Node for decompression dictionary
#[derive(Clone, Copy, Debug)]
struct DNode {
    /// Prefix node code
    next: Option<Code>,
    /// Byte value
    byte: u8,
}

/// LZW Data Decompressor
#[derive(Debug)]
pub struct Decompressor {
    /// Table of codes
    table: Vec<DNode>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last code
    last: Option<Code>,
    /// Current code
    code: u32,
    /// Number of bits in current code
    n_bits: u8,
    /// End code was reached
    done: bool,
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_bits: u8) -> Self {
        let mut dec = Decompressor {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
            code: 0,
            n_bits: 0,
            done: false,
        };
        dec.reset();
        dec
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.table.push(DNode {
                next: None,
                byte: byte as u8,
            });
        }
        // clear and end codes
        self.table.push(DNode { next: None, byte: 0 });
        self.table.push(DNode { next: None, byte: 0 });
        self.code_bits = Bits::from(self.min_code_bits + 1);
        self.last = None;
    }

    /// Decompress a byte buffer
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        for byte in bytes {
            if self.done {
                break;
            }
            self.code |= (*byte as u32) << self.n_bits;
            self.n_bits += 8;
            while !self.done && self.n_bits >= u8::from(self.code_bits) {
                let code = (self.code & self.code_bits.mask()) as Code;
                self.code >>= u8::from(self.code_bits);
                self.n_bits -= u8::from(self.code_bits);
                self.decompress_code(code, buffer)?;
            }
        }
        Ok(())
    }

    /// Decompress one code
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        if code == self.clear_code() {
            self.reset();
        } else if code == self.end_code() {
            self.done = true;
        } else {
            let next_code = self.next_code();
            let start = buffer.len();
            match self.last {
                None => {
                    if code >= self.clear_code() {
                        return Err(Error::InvalidLzwData);
                    }
                    buffer.push(code as u8);
                }
                Some(last) => {
                    if code > next_code {
                        return Err(Error::InvalidLzwData);
                    }
                    if next_code < Bits::MAX.entries() {
                        let byte = if code < next_code {
                            self.first_byte(code)
                        } else {
                            self.first_byte(last)
                        };
                        self.table.push(DNode {
                            next: Some(last),
                            byte,
                        });
                    } else if code == next_code {
                        return Err(Error::InvalidLzwData);
                    }
                    self.unwind(code, buffer);
                    buffer[start..].reverse();
                }
            }
            self.last = Some(code);
            if self.next_code() == self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        Ok(())
    }

    /// Get the first byte of a code's string
    fn first_byte(&self, code: Code) -> u8 {
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            node = self.table[code as usize];
        }
        node.byte
    }

    /// Push a code's string into a buffer (reversed)
    fn unwind(&self, code: Code, buffer: &mut Vec<u8>) {
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            buffer.push(node.byte);
            node = self.table[code as usize];
        }
        buffer.push(node.byte);
    }
}

/// Decompress a GIF image data stream, as produced by [compress].
///
/// The stream must contain the minimum code size, sub-blocks and terminator.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (&min_code_size, mut rest) =
        data.split_first().ok_or(Error::InvalidLzwData)?;
    if !(2..=11).contains(&min_code_size) {
        return Err(Error::InvalidCodeSize);
    }
    let mut dec = Decompressor::new(min_code_size);
    let mut buffer = Vec::with_capacity(data.len() * 2);
    loop {
        let (&len, tail) = rest.split_first().ok_or(Error::InvalidLzwData)?;
        let len = usize::from(len);
        if len == 0 {
            break;
        }
        if tail.len() < len {
            return Err(Error::InvalidLzwData);
        }
        dec.decompress(&tail[..len], &mut buffer)?;
        rest = &tail[len..];
    }
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    fn compress_raw(data: &[u8], min_code_bits: u8) -> Vec<u8> {
        let mut buffer = vec![];
        Compressor::new(min_code_bits).compress(data, &mut buffer);
        buffer
    }

    /// Split framed image data into its sub-blocks
    fn sub_blocks(data: &[u8]) -> Vec<&[u8]> {
        let mut blocks = vec![];
        let mut rest = &data[1..];
        loop {
            let len = rest[0] as usize;
            blocks.push(&rest[1..1 + len]);
            rest = &rest[1 + len..];
            if len == 0 {
                break;
            }
        }
        assert!(rest.is_empty());
        blocks
    }

    #[test]
    fn compress_small() {
        // clear, 1, 6, 6 (3 bits), end (4 bits)
        assert_eq!(compress_raw(&[1, 1, 1, 1, 1], 2), [0x8C, 0x5D]);
        let data = compress(&[1, 1, 1, 1, 1], 2).unwrap();
        assert_eq!(data, [0x02, 0x02, 0x8C, 0x5D, 0x00]);
        assert_eq!(decompress(&data).unwrap(), [1, 1, 1, 1, 1]);
    }

    #[test]
    fn compress_empty() {
        // clear, end
        let data = compress(&[], 2).unwrap();
        assert_eq!(data, [0x02, 0x01, 0x2C, 0x00]);
        assert_eq!(decompress(&data).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn compress_gift_image() {
        let image = [
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
        ];
        let data = compress(&image, 2).unwrap();
        assert_eq!(
            data,
            [
                0x02, 0x16, 0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33,
                0xA0, 0x02, 0x75, 0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C,
                0x04, 0x91, 0x4C, 0x01, 0x00,
            ]
        );
        assert_eq!(decompress(&data).unwrap(), image);
    }

    #[test]
    fn round_trip() {
        for min_code_bits in 2..=8 {
            let limit = 1u32 << min_code_bits;
            let data: Vec<u8> = (0..10_000u32)
                .map(|i| ((i * 7 + i / 13 + (i * i) % 11) % limit) as u8)
                .collect();
            let enc = compress(&data, min_code_bits).unwrap();
            assert_eq!(decompress(&enc).unwrap(), data);
        }
    }

    #[test]
    fn code_width_growth() {
        // 2^2 + 3 distinct pairs forces codes past 3 bits
        let mut data = vec![];
        for a in 0..4u8 {
            for b in 0..4u8 {
                data.push(a);
                data.push(b);
            }
        }
        assert!(data.len() / 2 >= (1 << 2) + 3);
        let mut compressor = Compressor::new(2);
        compressor.compress(&data, &mut vec![]);
        assert!(u8::from(compressor.code_bits) > 3);
        let enc = compress(&data, 2).unwrap();
        assert_eq!(decompress(&enc).unwrap(), data);
    }

    #[test]
    fn dictionary_reset() {
        // pseudo-random data fills the 12-bit dictionary several times
        let mut x = 0x1234_5678u32;
        let data: Vec<u8> = (0..200_000)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                (x >> 24) as u8
            })
            .collect();
        let enc = compress(&data, 8).unwrap();
        assert_eq!(decompress(&enc).unwrap(), data);
        let runs: Vec<u8> = data.iter().map(|b| b & 0b11).collect();
        let enc = compress(&runs, 2).unwrap();
        assert_eq!(decompress(&enc).unwrap(), runs);
    }

    #[test]
    fn sub_block_chunking() {
        let mut x = 7u32;
        let data: Vec<u8> = (0..5000)
            .map(|_| {
                x = x.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (x >> 16) as u8 & 0x0F
            })
            .collect();
        let raw = compress_raw(&data, 4);
        assert!(raw.len() > 255);
        let enc = compress(&data, 4).unwrap();
        assert_eq!(enc[0], 4);
        let blocks = sub_blocks(&enc);
        assert!(blocks.len() > 2);
        let (last, blocks) = blocks.split_last().unwrap();
        assert!(last.is_empty());
        for b in blocks {
            assert!((1..=255).contains(&b.len()));
        }
        assert_eq!(blocks.concat(), raw);
        assert_eq!(decompress(&enc).unwrap(), data);
    }

    #[test]
    fn exact_sub_block() {
        let data = frame_sub_blocks(2, &[0xAA; 255]);
        assert_eq!(data.len(), 1 + 1 + 255 + 1);
        assert_eq!(data[1], 255);
        assert_eq!(data[257], 0);
        let data = frame_sub_blocks(2, &[0xAA; 256]);
        assert_eq!(data.len(), 1 + 1 + 255 + 1 + 1 + 1);
        assert_eq!(data[257], 1);
        assert_eq!(data[259], 0);
        assert_eq!(frame_sub_blocks(3, &[]), [3, 0]);
    }

    #[test]
    fn invalid_input() {
        assert!(matches!(compress(&[0], 1), Err(Error::InvalidCodeSize)));
        assert!(matches!(compress(&[0], 9), Err(Error::InvalidCodeSize)));
        assert!(matches!(compress(&[4], 2), Err(Error::InvalidColorIndex)));
        assert!(matches!(decompress(&[2, 5, 0]), Err(Error::InvalidLzwData)));
        assert!(matches!(decompress(&[]), Err(Error::InvalidLzwData)));
    }
}
