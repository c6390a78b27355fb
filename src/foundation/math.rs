use kurbo::{Point, Rect, Vec2};
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5e1f_7a3c_0b9d_4e21;

/// 128-bit structural fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Length-prefixed so adjacent strings never alias.
    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_usize(s.len());
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn write_point(&mut self, p: Point) {
        self.write_f64(p.x);
        self.write_f64(p.y);
    }

    pub(crate) fn write_rect(&mut self, r: Rect) {
        self.write_f64(r.x0);
        self.write_f64(r.y0);
        self.write_f64(r.x1);
        self.write_f64(r.y1);
    }

    pub(crate) fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

/// z-component of `(a - o) x (b - o)`; positive when `o -> a -> b` turns counter-clockwise.
pub(crate) fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a - o).cross(b - o)
}

pub(crate) fn is_finite_point(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Vertices of a regular polygon inscribed in the circle `(center, radius)`.
pub(crate) fn regular_polygon(center: Point, radius: f64, sides: usize, phase: f64) -> Vec<Point> {
    let step = std::f64::consts::TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let a = phase + step * i as f64;
            center + Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// Number of chords needed so an inscribed polygon stays within `tolerance` of its circle.
pub(crate) fn circle_segments(radius: f64, tolerance: f64) -> usize {
    if radius <= tolerance {
        return 8;
    }
    let half_angle = (1.0 - tolerance / radius).acos();
    let n = (std::f64::consts::PI / half_angle).ceil();
    (n as usize).clamp(8, 1024)
}
