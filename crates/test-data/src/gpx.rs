//! Hand-written GPX documents.
//!
//! Kept independent of the `gpx` crate so the reader in `gpst` can be checked
//! against a document it did not produce itself.

use gpst::{MetaField, PointField, Track, field::timestamp_str};

/// Renders `track` as GPX 1.1: one track, one segment, one `trkpt` per
/// located point with elevation and time. The summary `sport` becomes the
/// track `<type>`.
pub fn generate_gpx(track: &Track, activity_name: &str) -> Vec<u8> {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="gpst-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1">"#);
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(activity_name)));
    if let Some(sport) = track.metadata(&MetaField::Sport).and_then(|v| v.as_str()) {
        gpx.push_str(&format!("    <type>{}</type>\n", escape_xml(sport)));
    }
    gpx.push_str("    <trkseg>\n");

    for (timestamp, point) in track.points_iter() {
        let (Some(lat), Some(lon)) = (
            point.get_f64(&PointField::Latitude),
            point.get_f64(&PointField::Longitude),
        ) else {
            continue;
        };

        gpx.push_str(&format!(r#"      <trkpt lat="{lat:.7}" lon="{lon:.7}">"#));
        gpx.push('\n');
        if let Some(ele) = point.get_f64(&PointField::Elevation) {
            gpx.push_str(&format!("        <ele>{ele:.2}</ele>\n"));
        }
        gpx.push_str(&format!("        <time>{}</time>\n", timestamp_str(timestamp)));
        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpst::Value;
    use time::{Duration, macros::datetime};

    fn two_point_track() -> Track {
        let start = datetime!(2024-06-01 07:00:00 UTC);
        let mut track = Track::new();
        track.upsert_point(
            start,
            [
                (PointField::Latitude, Value::from(40.0150)),
                (PointField::Longitude, Value::from(-105.2705)),
                (PointField::Elevation, Value::from(1650.0)),
            ],
        );
        track.upsert_point(
            start + Duration::seconds(60),
            [
                (PointField::Latitude, Value::from(40.0160)),
                (PointField::Longitude, Value::from(-105.2695)),
            ],
        );
        track.upsert_point(
            start + Duration::seconds(90),
            [(PointField::HeartRate, Value::from(130.0))],
        );
        track
    }

    #[test]
    fn test_generate_gpx_basic() {
        let gpx = generate_gpx(&two_point_track(), "Test Activity");
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains(r#"version="1.1""#));
        assert!(gpx_str.contains("<name>Test Activity</name>"));
        assert!(gpx_str.contains(r#"lat="40.0150000""#));
        assert!(gpx_str.contains(r#"lon="-105.2705000""#));
        assert!(gpx_str.contains("<ele>1650.00</ele>"));
        assert!(gpx_str.contains("<time>2024-06-01T07:01:00Z</time>"));
        assert_eq!(gpx_str.matches("<trkpt").count(), 2);
    }

    #[test]
    fn test_generate_gpx_escapes_special_chars() {
        let gpx = generate_gpx(&Track::new(), "Test & <Activity> \"Name\"");
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains("Test &amp; &lt;Activity&gt; &quot;Name&quot;"));
    }

    #[test]
    fn test_generated_gpx_parses() {
        let mut track = two_point_track();
        track.set_metadata(MetaField::Sport, "hiking");

        let parsed = gpst::file_parsers::parse_gpx(&generate_gpx(&track, "Walk")).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.metadata(&MetaField::Sport), Some(&Value::from("hiking")));
        assert_eq!(parsed.metadata(&MetaField::Name), Some(&Value::from("Walk")));
    }
}
