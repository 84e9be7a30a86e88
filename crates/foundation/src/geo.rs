use serde::{Deserialize, Serialize};

/// A geographic position in degrees, longitude first (GeoJSON order).
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    /// Bitwise identity, so `NaN` positions still compare equal to themselves.
    pub fn same_bits(&self, other: &LngLat) -> bool {
        self.lng.to_bits() == other.lng.to_bits() && self.lat.to_bits() == other.lat.to_bits()
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        LngLat::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Ordered polygon outline. Closure (first == last) is not required.
pub type Ring = Vec<LngLat>;

/// Number of distinct positions in `ring`, ignoring order.
pub fn distinct_points(ring: &[LngLat]) -> usize {
    let mut seen: Vec<LngLat> = Vec::with_capacity(ring.len());
    for p in ring {
        if !seen.iter().any(|q| q.same_bits(p)) {
            seen.push(*p);
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::{LngLat, distinct_points};

    #[test]
    fn closed_ring_counts_closing_point_once() {
        let ring = vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(1.0, 0.0),
            LngLat::new(1.0, 1.0),
            LngLat::new(0.0, 0.0),
        ];
        assert_eq!(distinct_points(&ring), 3);
    }

    #[test]
    fn nan_positions_are_not_finite() {
        assert!(!LngLat::new(f64::NAN, 1.0).is_finite());
        assert!(LngLat::new(f64::NAN, 1.0).same_bits(&LngLat::new(f64::NAN, 1.0)));
    }
}
