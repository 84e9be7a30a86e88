//! Restricted WKT polygon reader.
//!
//! Only a single outer ring is understood:
//!
//! ```text
//! POLYGON((lng1 lat1, lng2 lat2, ..., lngN latN))
//! ```
//!
//! The keyword is matched case-insensitively anywhere in the input, followed
//! by optional whitespace, `((`, a run of characters that are not `)`, and
//! `))`. Holed polygons therefore never match, while a `MULTIPOLYGON` wrapper
//! matches on its inner keyword and yields one (malformed) ring.

use foundation::geo::{LngLat, Ring, distinct_points};

const KEYWORD: &[u8] = b"POLYGON";

/// Smallest number of distinct positions the strict reader accepts.
pub const MIN_DISTINCT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WktError {
    /// No `POLYGON((...))` shape anywhere in the text.
    NoPolygon,
    /// A coordinate token is not a finite number.
    InvalidNumber { pair: usize, token: String },
    /// A pair does not hold exactly two tokens.
    WrongArity { pair: usize, found: usize },
    TooFewPoints { distinct: usize },
}

impl std::fmt::Display for WktError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WktError::NoPolygon => write!(f, "no POLYGON((...)) found"),
            WktError::InvalidNumber { pair, token } => {
                write!(f, "pair {pair}: invalid coordinate {token:?}")
            }
            WktError::WrongArity { pair, found } => {
                write!(f, "pair {pair}: expected 2 coordinates, found {found}")
            }
            WktError::TooFewPoints { distinct } => write!(
                f,
                "ring has {distinct} distinct points, need at least {MIN_DISTINCT_POINTS}"
            ),
        }
    }
}

impl std::error::Error for WktError {}

/// Lenient reader used for map rendering.
///
/// Returns `None` when the text has no polygon shape. Inside a matched shape
/// nothing is validated: unparsable, missing or empty coordinates become
/// `NaN` instead of rejecting the whole string.
pub fn parse_polygon(text: &str) -> Option<Ring> {
    let inner = capture_outer_ring(text)?;
    let ring = inner
        .split(',')
        .map(|pair| {
            let mut tokens = pair.split_whitespace();
            let lng = lenient_number(tokens.next());
            let lat = lenient_number(tokens.next());
            LngLat::new(lng, lat)
        })
        .collect();
    Some(ring)
}

/// Strict reader: every pair must be exactly two finite numbers and the ring
/// must have at least [`MIN_DISTINCT_POINTS`] distinct positions.
pub fn parse_polygon_strict(text: &str) -> Result<Ring, WktError> {
    let inner = capture_outer_ring(text).ok_or(WktError::NoPolygon)?;

    let mut ring = Ring::new();
    for (pair_index, pair) in inner.split(',').enumerate() {
        let tokens: Vec<&str> = pair.split_whitespace().collect();
        if tokens.len() != 2 {
            return Err(WktError::WrongArity {
                pair: pair_index,
                found: tokens.len(),
            });
        }
        let lng = strict_number(pair_index, tokens[0])?;
        let lat = strict_number(pair_index, tokens[1])?;
        ring.push(LngLat::new(lng, lat));
    }

    let distinct = distinct_points(&ring);
    if distinct < MIN_DISTINCT_POINTS {
        return Err(WktError::TooFewPoints { distinct });
    }
    Ok(ring)
}

/// Returns the text between `((` and `))` of the first matching shape.
fn capture_outer_ring(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut from = 0usize;
    while let Some(at) = find_keyword(bytes, from) {
        // The keyword is ASCII, so `at + len` is a char boundary.
        if let Some(inner) = match_after_keyword(&text[at + KEYWORD.len()..]) {
            return Some(inner);
        }
        from = at + 1;
    }
    None
}

fn find_keyword(bytes: &[u8], from: usize) -> Option<usize> {
    bytes
        .windows(KEYWORD.len())
        .enumerate()
        .skip(from)
        .find(|(_, w)| w.eq_ignore_ascii_case(KEYWORD))
        .map(|(i, _)| i)
}

fn match_after_keyword(rest: &str) -> Option<&str> {
    let rest = rest.trim_start().strip_prefix("((")?;
    // `[^)]+` is greedy and must be followed by `)`, so the only candidate run
    // ends at the first `)`.
    let end = rest.find(')')?;
    if end == 0 {
        return None;
    }
    let (inner, tail) = rest.split_at(end);
    tail.starts_with("))").then_some(inner)
}

fn lenient_number(token: Option<&str>) -> f64 {
    token
        .and_then(|t| t.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn strict_number(pair: usize, token: &str) -> Result<f64, WktError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(WktError::InvalidNumber {
            pair,
            token: token.to_string(),
        }),
    }
}
