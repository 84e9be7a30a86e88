use foundation::ids::PolygonId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judicial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub code: i64,
}

/// One row of the court-find response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtFindResult {
    pub id: PolygonId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// WKT polygon text.
    pub polygon: String,
    pub judicial: Judicial,
}

/// The slice of a result the map needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonRecord {
    pub id: PolygonId,
    pub name: String,
    pub wkt: String,
}

impl PolygonRecord {
    pub fn new(id: impl Into<PolygonId>, name: impl Into<String>, wkt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wkt: wkt.into(),
        }
    }
}

impl From<&CourtFindResult> for PolygonRecord {
    fn from(r: &CourtFindResult) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            wkt: r.polygon.clone(),
        }
    }
}

pub fn polygon_records(results: &[CourtFindResult]) -> Vec<PolygonRecord> {
    results.iter().map(PolygonRecord::from).collect()
}

pub fn results_from_json(raw: &str) -> Result<Vec<CourtFindResult>, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::{PolygonRecord, polygon_records, results_from_json};
    use pretty_assertions::assert_eq;

    const RESPONSE: &str = r#"[
        {
            "id": "7d1c",
            "name": "Court 12",
            "address": "Enghelab St.",
            "phone": "021-000",
            "description": "",
            "polygon": "POLYGON((51.3 35.6, 51.4 35.6, 51.4 35.7, 51.3 35.6))",
            "judicial": { "id": "j1", "name": "Family", "code": 3 }
        },
        {
            "id": "9a02",
            "name": "Court 4",
            "polygon": "POLYGON((0 0, 1 0, 1 1))",
            "judicial": { "name": "Civil", "code": 1 }
        }
    ]"#;

    #[test]
    fn decodes_response_with_optional_fields() {
        let results = results_from_json(RESPONSE).expect("decode");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].address.as_deref(), Some("Enghelab St."));
        assert_eq!(results[1].address, None);
        assert_eq!(results[1].judicial.id, None);
        assert_eq!(results[1].judicial.code, 1);
    }

    #[test]
    fn projects_polygon_records_in_order() {
        let results = results_from_json(RESPONSE).expect("decode");
        let records = polygon_records(&results);
        assert_eq!(
            records,
            vec![
                PolygonRecord::new(
                    "7d1c",
                    "Court 12",
                    "POLYGON((51.3 35.6, 51.4 35.6, 51.4 35.7, 51.3 35.6))"
                ),
                PolygonRecord::new("9a02", "Court 4", "POLYGON((0 0, 1 0, 1 1))"),
            ]
        );
    }
}
