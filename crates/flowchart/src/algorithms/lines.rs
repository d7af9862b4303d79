use std::f64::consts::PI;

use image::GrayImage;
use crate::{
    config::ExtractionConfig,
    error::Result,
    traits::LineDetector,
    types::Segment,
};

/// Fixed-point precision used while walking along a candidate line
const SHIFT: i64 = 16;

/// Progressive probabilistic Hough transform.
///
/// Edge pixels vote one at a time; as soon as a bin reaches `vote_threshold`
/// the line through the current pixel is followed in both directions,
/// bridging gaps of up to `max_gap` pixels. Long enough runs become segments
/// and their pixels are removed from further voting.
///
/// Pixels are visited in raster order rather than randomly, which keeps the
/// output identical between runs on the same edge map.
#[derive(Debug, Clone)]
pub struct ProbabilisticHoughDetector {
    pub vote_threshold: u32,
    pub min_length: u32,
    pub max_gap: u32,
    /// Distance resolution of the accumulator in pixels
    pub rho: f64,
    /// Angle resolution of the accumulator in radians
    pub theta: f64,
    /// Stop after this many segments, if set
    pub max_lines: Option<usize>,
}

impl Default for ProbabilisticHoughDetector {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ProbabilisticHoughDetector {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            vote_threshold: config.hough_vote_threshold,
            min_length: config.arrow_min_len,
            max_gap: config.hough_max_gap,
            rho: 1.0,
            theta: PI / 180.0,
            max_lines: None,
        }
    }
}

/// Working state for one transform
struct Accumulator {
    width: i32,
    height: i32,
    num_angle: usize,
    num_rho: usize,
    /// Precomputed `(cos, sin) / rho` per angle bin
    trig: Vec<(f64, f64)>,
    votes: Vec<i32>,
}

impl Accumulator {
    fn new(width: u32, height: u32, rho: f64, theta: f64) -> Self {
        let num_angle = ((PI / theta).round() as usize).max(1);
        let num_rho = (((width + height) as f64 * 2.0 + 1.0) / rho).round() as usize;
        let trig = (0..num_angle)
            .map(|n| {
                let angle = n as f64 * theta;
                (angle.cos() / rho, angle.sin() / rho)
            })
            .collect();
        Self {
            width: width as i32,
            height: height as i32,
            num_angle,
            num_rho,
            trig,
            votes: vec![0; num_angle * num_rho],
        }
    }

    fn bin(&self, n: usize, x: i32, y: i32) -> usize {
        let (cos, sin) = self.trig[n];
        let r = (x as f64 * cos + y as f64 * sin).round() as i64 + (self.num_rho as i64 - 1) / 2;
        n * self.num_rho + r as usize
    }

    /// Add the votes of one pixel and return the strongest bin's `(votes, angle index)`
    fn vote(&mut self, x: i32, y: i32) -> (i32, usize) {
        let mut best = (0, 0);
        for n in 0..self.num_angle {
            let bin = self.bin(n, x, y);
            self.votes[bin] += 1;
            if self.votes[bin] > best.0 {
                best = (self.votes[bin], n);
            }
        }
        best
    }

    fn unvote(&mut self, x: i32, y: i32) {
        for n in 0..self.num_angle {
            let bin = self.bin(n, x, y);
            self.votes[bin] -= 1;
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }
}

/// Fixed-point walker along a line through a seed pixel.
///
/// Positions are `i64` so the shifted minor axis holds any `i32` coordinate.
#[derive(Debug, Clone, Copy)]
struct Walk {
    x0: i64,
    y0: i64,
    dx0: i64,
    dy0: i64,
    /// Step along x by whole pixels (line is closer to horizontal)
    x_major: bool,
}

impl Walk {
    fn new(x: i32, y: i32, angle: f64) -> Self {
        let a = -angle.sin();
        let b = angle.cos();
        let one = (1i64 << SHIFT) as f64;
        let (x, y) = (i64::from(x), i64::from(y));
        if a.abs() > b.abs() {
            Self {
                x0: x,
                y0: (y << SHIFT) + (1 << (SHIFT - 1)),
                dx0: if a > 0.0 { 1 } else { -1 },
                dy0: (b * one / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: (x << SHIFT) + (1 << (SHIFT - 1)),
                y0: y,
                dx0: (a * one / b.abs()).round() as i64,
                dy0: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixel positions in direction `k` (0 = forward, 1 = backward)
    fn pixels(&self, k: usize) -> impl Iterator<Item = (i32, i32)> {
        let (dx, dy) = if k == 0 { (self.dx0, self.dy0) } else { (-self.dx0, -self.dy0) };
        let x_major = self.x_major;
        let mut pos = (self.x0, self.y0);
        std::iter::from_fn(move || {
            let (x, y) = pos;
            pos = (x + dx, y + dy);
            let (x, y) = if x_major { (x, y >> SHIFT) } else { (x >> SHIFT, y) };
            Some((x as i32, y as i32))
        })
    }
}

impl LineDetector for ProbabilisticHoughDetector {
    fn detect_lines(&self, edges: &GrayImage) -> Result<Vec<Segment>> {
        let (width, height) = edges.dimensions();
        let mut acc = Accumulator::new(width, height, self.rho, self.theta);

        // 1 = unclaimed edge pixel
        let mut mask: Vec<u8> = edges.pixels().map(|p| u8::from(p[0] > 0)).collect();
        let mut voted = vec![false; mask.len()];
        let points: Vec<(i32, i32)> = edges
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(x, y, _)| (x as i32, y as i32))
            .collect();

        let threshold = self.vote_threshold as i32;
        let max_gap = self.max_gap as i32;
        let min_length = self.min_length as i32;
        let mut segments = Vec::new();

        for &(px, py) in &points {
            let idx = acc.index(px, py);
            // Already claimed by an earlier line
            if mask[idx] == 0 {
                continue;
            }

            let (max_votes, max_n) = acc.vote(px, py);
            voted[idx] = true;
            if max_votes < threshold {
                continue;
            }

            let walk = Walk::new(px, py, max_n as f64 * self.theta);

            let mut ends = [(px, py); 2];
            for (k, end) in ends.iter_mut().enumerate() {
                let mut gap = 0;
                for (x, y) in walk.pixels(k) {
                    if !acc.contains(x, y) {
                        break;
                    }
                    if mask[acc.index(x, y)] != 0 {
                        gap = 0;
                        *end = (x, y);
                    } else {
                        gap += 1;
                        if gap > max_gap {
                            break;
                        }
                    }
                }
            }

            let good_line = (ends[1].0 - ends[0].0).abs() >= min_length
                || (ends[1].1 - ends[0].1).abs() >= min_length;

            // Claim the pixels of the walked run so they cannot seed again
            for (k, &end) in ends.iter().enumerate() {
                for (x, y) in walk.pixels(k) {
                    let idx = acc.index(x, y);
                    if mask[idx] != 0 {
                        if good_line && voted[idx] {
                            acc.unvote(x, y);
                            voted[idx] = false;
                        }
                        mask[idx] = 0;
                    }
                    if (x, y) == end {
                        break;
                    }
                }
            }

            if good_line {
                segments.push(Segment::new(ends[0].0, ends[0].1, ends[1].0, ends[1].1));
                if self.max_lines.is_some_and(|max| segments.len() >= max) {
                    break;
                }
            }
        }

        tracing::debug!(
            edge_pixels = points.len(),
            segments = segments.len(),
            "Line detection finished"
        );
        Ok(segments)
    }
}
