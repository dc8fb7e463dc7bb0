use criterion::{Criterion, black_box, criterion_group, criterion_main};
use giffer::{
    AnimationEnc, AnimationParams, CellGrid, ColorTable, Selection, lzw,
};

/// Grid of pseudo-random cells which drifts every generation
struct Soup(u64);

impl CellGrid for Soup {
    fn cell_state(&self, x: i64, y: i64) -> u8 {
        let h = (x as u64)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add((y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
            .wrapping_add(self.0);
        ((h >> 61) & 1) as u8
    }
    fn advance(&mut self, generations: u64) {
        self.0 = self.0.wrapping_add(generations);
    }
}

fn compress_pixels(crit: &mut Criterion) {
    let soup = Soup(0);
    let pixels: Vec<u8> = (0..256 * 256)
        .map(|i: i64| soup.cell_state(i % 256, i / 256))
        .collect();
    crit.bench_function("compress_pixels", |b| {
        b.iter(|| lzw::compress(black_box(&pixels), 2).unwrap())
    });
}

fn encode_animation(crit: &mut Criterion) {
    crit.bench_function("encode_animation", |b| {
        b.iter(|| {
            let params = AnimationParams::default()
                .with_generation_count(4)
                .with_cell_offset(3, -2)
                .with_frames_per_generation(4)
                .with_cell_size(6, 1);
            let sel = Some(Selection::new(-16, -16, 32, 32));
            let enc = AnimationEnc::new(params, ColorTable::lifewiki(), sel)
                .unwrap();
            enc.encode_all(&mut Soup(0), &mut |_: u64, _: u64| ())
                .unwrap()
        })
    });
}

criterion_group!(benches, compress_pixels, encode_animation);
criterion_main!(benches);
