// life.rs      Conway's Game of Life
//
// Copyright (c) 2025  Douglas Lau
//
use giffer::{CellGrid, Error, Result, Selection};
use std::collections::{HashMap, HashSet};

/// Unbounded Life grid (rule B3/S23)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifeGrid {
    /// Live cells
    live: HashSet<(i64, i64)>,
    /// Current generation
    generation: u64,
}

impl CellGrid for LifeGrid {
    fn cell_state(&self, x: i64, y: i64) -> u8 {
        self.live.contains(&(x, y)) as u8
    }

    fn advance(&mut self, generations: u64) {
        for _ in 0..generations {
            self.step();
        }
    }
}

impl FromIterator<(i64, i64)> for LifeGrid {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        LifeGrid {
            live: iter.into_iter().collect(),
            generation: 0,
        }
    }
}

impl LifeGrid {
    /// Parse a pattern in RLE or plaintext format
    pub fn parse(text: &str) -> Result<Self> {
        let first = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'));
        match first {
            Some(l) if is_rle_header(l) => Self::parse_rle(text),
            _ => Self::parse_plaintext(text),
        }
    }

    /// Parse a plaintext (`.cells`) pattern
    pub fn parse_plaintext(text: &str) -> Result<Self> {
        let mut live = HashSet::new();
        let rows = text.lines().filter(|l| !l.starts_with('!'));
        for (y, line) in rows.enumerate() {
            for (x, c) in line.trim_end().chars().enumerate() {
                match c {
                    '.' => (),
                    'O' | '*' => {
                        live.insert((x as i64, y as i64));
                    }
                    _ => return Err(invalid(format!("cell '{}'", c))),
                }
            }
        }
        Ok(LifeGrid {
            live,
            generation: 0,
        })
    }

    /// Parse a run-length encoded (`.rle`) pattern
    pub fn parse_rle(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let header = lines.next().ok_or_else(|| invalid("no RLE header"))?;
        check_rle_header(header)?;
        let mut live = HashSet::new();
        let (mut x, mut y) = (0i64, 0i64);
        let mut run: Option<i64> = None;
        for c in lines.flat_map(str::chars) {
            if let Some(d) = c.to_digit(10) {
                let n = run.unwrap_or(0);
                let n = n
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(i64::from(d)))
                    .ok_or_else(|| invalid("RLE run too long"))?;
                run = Some(n);
                continue;
            }
            let n = run.take().unwrap_or(1);
            match c {
                'b' | '.' => x += n,
                'o' | 'A' => {
                    for _ in 0..n {
                        live.insert((x, y));
                        x += 1;
                    }
                }
                '$' => {
                    x = 0;
                    y += n;
                }
                '!' => break,
                c if c.is_whitespace() => (),
                _ => return Err(invalid(format!("RLE tag '{}'", c))),
            }
        }
        Ok(LifeGrid {
            live,
            generation: 0,
        })
    }

    /// Get the number of live cells
    pub fn population(&self) -> usize {
        self.live.len()
    }

    /// Get the current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Get the bounding box of live cells
    pub fn bounds(&self) -> Option<Selection> {
        let x0 = self.live.iter().map(|c| c.0).min()?;
        let x1 = self.live.iter().map(|c| c.0).max()?;
        let y0 = self.live.iter().map(|c| c.1).min()?;
        let y1 = self.live.iter().map(|c| c.1).max()?;
        let width = u32::try_from(x1 - x0 + 1).ok()?;
        let height = u32::try_from(y1 - y0 + 1).ok()?;
        Some(Selection::new(x0, y0, width, height))
    }

    /// Advance one generation
    pub fn step(&mut self) {
        let mut neighbors: HashMap<(i64, i64), u8> = HashMap::new();
        for &(x, y) in &self.live {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx != 0 || dy != 0 {
                        *neighbors.entry((x + dx, y + dy)).or_default() += 1;
                    }
                }
            }
        }
        self.live = neighbors
            .into_iter()
            .filter(|(c, n)| *n == 3 || (*n == 2 && self.live.contains(c)))
            .map(|(c, _)| c)
            .collect();
        self.generation += 1;
    }
}

fn invalid<S: Into<String>>(msg: S) -> Error {
    Error::InvalidParameter(msg.into())
}

/// Check if a line is an RLE header (`x = 3, y = 3`)
fn is_rle_header(line: &str) -> bool {
    line.strip_prefix('x')
        .map(|r| r.trim_start().starts_with('='))
        .unwrap_or(false)
}

/// Check that an RLE header uses the Life rule
fn check_rle_header(header: &str) -> Result<()> {
    if !is_rle_header(header) {
        return Err(invalid(format!("RLE header: {}", header)));
    }
    for field in header.split(',') {
        if let Some((key, value)) = field.split_once('=') {
            if key.trim() == "rule" {
                let rule = value.trim().to_ascii_uppercase();
                if rule != "B3/S23" && rule != "23/3" {
                    return Err(invalid(format!("rule {}", value.trim())));
                }
            }
        }
    }
    Ok(())
}
