use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bounding box used when a record carries no geometry.
pub const WHOLE_GLOBE_BBOX: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

/// GeoJSON-shaped geometry (`{"type": ..., "coordinates": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    /// Exterior ring first, then holes.
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    /// `[min_x, min_y, max_x, max_y]`; holes never extend the exterior.
    pub fn bbox(&self) -> [f64; 4] {
        match self {
            Geometry::Point([x, y]) => [*x, *y, *x, *y],
            Geometry::Polygon(rings) => {
                let exterior = match rings.first() {
                    Some(ring) if !ring.is_empty() => ring,
                    _ => return WHOLE_GLOBE_BBOX,
                };
                let mut bbox = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
                for [x, y] in exterior {
                    bbox[0] = bbox[0].min(*x);
                    bbox[1] = bbox[1].min(*y);
                    bbox[2] = bbox[2].max(*x);
                    bbox[3] = bbox[3].max(*y);
                }
                bbox
            }
        }
    }
}

/// Bounding box of an optional geometry, falling back to the whole globe.
pub fn bbox_or_globe(geometry: Option<&Geometry>) -> [f64; 4] {
    geometry.map(Geometry::bbox).unwrap_or(WHOLE_GLOBE_BBOX)
}

/// `Multipolygon` cells are accepted but never parsed.
pub fn is_multipolygon(source: &str) -> bool {
    source.trim().starts_with("Multipolygon")
}

/// Parses the `Polygon` column.
///
/// Accepted shapes are a JSON position `[x, y]`, a single ring
/// `[[x, y], ...]`, or a ring list `[[[x, y], ...], [hole...]]`. Values
/// starting with `Multipolygon` are not parsed and yield no geometry.
pub fn parse_geometry(source: &str) -> Result<Option<Geometry>, String> {
    let source = source.trim();
    if source.is_empty() || is_multipolygon(source) {
        return Ok(None);
    }

    let raw: Value =
        serde_json::from_str(source).map_err(|err| format!("invalid geometry json: {}", err))?;
    match depth(&raw) {
        1 => Ok(Some(Geometry::Point(position(&raw)?))),
        2 => Ok(Some(Geometry::Polygon(vec![ring(&raw)?]))),
        3 => {
            let rings = raw
                .as_array()
                .map(|rings| rings.iter().map(ring).collect::<Result<Vec<_>, _>>())
                .unwrap_or_else(|| Ok(Vec::new()))?;
            Ok(Some(Geometry::Polygon(rings)))
        }
        other => Err(format!("unsupported geometry nesting depth {}", other)),
    }
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.first().map(depth).unwrap_or(0),
        _ => 0,
    }
}

fn position(value: &Value) -> Result<[f64; 2], String> {
    let coords = value
        .as_array()
        .ok_or_else(|| "position must be an array".to_string())?;
    if coords.len() < 2 {
        return Err(format!("position needs 2 coordinates, found {}", coords.len()));
    }
    let x = coords[0]
        .as_f64()
        .ok_or_else(|| format!("non-numeric coordinate {}", coords[0]))?;
    let y = coords[1]
        .as_f64()
        .ok_or_else(|| format!("non-numeric coordinate {}", coords[1]))?;
    Ok([x, y])
}

fn ring(value: &Value) -> Result<Vec<[f64; 2]>, String> {
    value
        .as_array()
        .ok_or_else(|| "ring must be an array".to_string())?
        .iter()
        .map(position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_has_no_geometry() {
        assert_eq!(parse_geometry("").unwrap(), None);
        assert_eq!(parse_geometry("   ").unwrap(), None);
    }

    #[test]
    fn parses_point() {
        let geom = parse_geometry("[12.5, -3]").unwrap().unwrap();
        assert_eq!(geom, Geometry::Point([12.5, -3.0]));
        assert_eq!(geom.bbox(), [12.5, -3.0, 12.5, -3.0]);
    }

    #[test]
    fn parses_polygon_with_hole() {
        let src = "[[[0,0],[10,0],[10,5],[0,5],[0,0]],[[2,2],[3,2],[3,3],[2,2]]]";
        let geom = parse_geometry(src).unwrap().unwrap();
        match &geom {
            Geometry::Polygon(rings) => assert_eq!(rings.len(), 2),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(geom.bbox(), [0.0, 0.0, 10.0, 5.0]);
    }

    #[test]
    fn multipolygon_is_skipped() {
        let geom = parse_geometry("Multipolygon(((0 0, 1 1, 1 0, 0 0)))").unwrap();
        assert_eq!(geom, None);
        assert_eq!(bbox_or_globe(geom.as_ref()), WHOLE_GLOBE_BBOX);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_geometry("not json").is_err());
        assert!(parse_geometry("[\"a\", \"b\"]").is_err());
    }

    #[test]
    fn geometry_serializes_as_geojson() {
        let value = serde_json::to_value(Geometry::Point([1.0, 2.0])).unwrap();
        assert_eq!(value["type"], "Point");
        assert_eq!(value["coordinates"][0], 1.0);
    }
}
