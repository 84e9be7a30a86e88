use foundation::geo::LngLat;
use serde::{Deserialize, Serialize};

/// Inputs of the court-find query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindParams {
    pub judicial_ids: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl FindParams {
    pub fn new(judicial_ids: Vec<String>, position: LngLat) -> Self {
        Self {
            judicial_ids,
            latitude: position.lat,
            longitude: position.lng,
        }
    }

    /// The query only runs with a marker and at least one selected court.
    pub fn enabled(judicial_ids: &[String], marker: Option<LngLat>) -> Option<Self> {
        let marker = marker?;
        if judicial_ids.is_empty() {
            return None;
        }
        Some(Self::new(judicial_ids.to_vec(), marker))
    }

    pub fn key(&self) -> QueryKey {
        QueryKey {
            judicial_ids: self.judicial_ids.join(","),
            lat: self.latitude,
            lng: self.longitude,
        }
    }

    /// `judicial_ids=a&judicial_ids=b&lat=..&lng=..`
    pub fn query_string(&self) -> String {
        let mut parts: Vec<String> = self
            .judicial_ids
            .iter()
            .map(|id| format!("judicial_ids={}", encode_component(id)))
            .collect();
        parts.push(format!("lat={}", self.latitude));
        parts.push(format!("lng={}", self.longitude));
        parts.join("&")
    }

    pub fn path(&self) -> String {
        format!("/court/find?{}", self.query_string())
    }
}

/// Identity of one fetch: `("courts", "find", ids joined by ",", lat, lng)`.
///
/// Coordinates compare by bit pattern so keys are usable as exact identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryKey {
    pub judicial_ids: String,
    pub lat: f64,
    pub lng: f64,
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.judicial_ids == other.judicial_ids
            && self.lat.to_bits() == other.lat.to_bits()
            && self.lng.to_bits() == other.lng.to_bits()
    }
}

impl Eq for QueryKey {}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "courts/find/{}/{}/{}", self.judicial_ids, self.lat, self.lng)
    }
}

/// Splits the `courts` page parameter into ids, dropping blanks.
pub fn parse_courts_param(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|id| !id.trim().is_empty())
        .map(|id| id.to_string())
        .collect()
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{FindParams, parse_courts_param};
    use foundation::geo::LngLat;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn disabled_without_marker_or_courts() {
        assert!(FindParams::enabled(&ids(&["a"]), None).is_none());
        assert!(FindParams::enabled(&[], Some(LngLat::new(1.0, 2.0))).is_none());
        let p = FindParams::enabled(&ids(&["a"]), Some(LngLat::new(1.0, 2.0))).expect("enabled");
        assert_eq!(p.latitude, 2.0);
        assert_eq!(p.longitude, 1.0);
    }

    #[test]
    fn query_string_repeats_array_entries() {
        let p = FindParams::new(ids(&["a1", "b 2"]), LngLat::new(51.338, 35.6997));
        assert_eq!(
            p.path(),
            "/court/find?judicial_ids=a1&judicial_ids=b%202&lat=35.6997&lng=51.338"
        );
    }

    #[test]
    fn keys_compare_ids_and_position() {
        let a = FindParams::new(ids(&["x", "y"]), LngLat::new(1.0, 2.0)).key();
        let b = FindParams::new(ids(&["x", "y"]), LngLat::new(1.0, 2.0)).key();
        let moved = FindParams::new(ids(&["x", "y"]), LngLat::new(1.0, 2.5)).key();
        let other_ids = FindParams::new(ids(&["y", "x"]), LngLat::new(1.0, 2.0)).key();
        assert_eq!(a, b);
        assert_ne!(a, moved);
        assert_ne!(a, other_ids);
        assert_eq!(a.to_string(), "courts/find/x,y/2/1");
    }

    #[test]
    fn courts_param_drops_blank_ids() {
        assert_eq!(parse_courts_param("a,, b ,,"), ids(&["a", " b "]));
        assert!(parse_courts_param("").is_empty());
    }
}
