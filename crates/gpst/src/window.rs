//! Key-bounded sliding windows over ordered points.

use time::OffsetDateTime;

use crate::{field::PointField, track::Point};

/// Points around a center point, in sequence order.
pub type Window<'a> = Vec<&'a Point>;

/// Yields `(timestamp, point, window)` for every point of a track.
///
/// The window of a point is the widest contiguous run around it, restricted
/// to points carrying `key`, whose boundary values differ from the point's own
/// value by at most `size / 2` on each side. Points without `key` are skipped
/// over without breaking the run, and get an empty window themselves.
///
/// The key is expected to grow along the sequence (elapsed time, cumulative
/// distance) but this is not checked: expansion simply stops at the first
/// keyed neighbour outside the bound.
#[derive(Debug, Clone)]
pub struct SlidingWindows<'a> {
    entries: Vec<(OffsetDateTime, &'a Point, Option<f64>)>,
    half_span: f64,
    cursor: usize,
}

impl<'a> SlidingWindows<'a> {
    pub fn new(
        points: impl IntoIterator<Item = (OffsetDateTime, &'a Point)>,
        key: PointField,
        size: f64,
    ) -> Self {
        let entries = points
            .into_iter()
            .map(|(ts, point)| (ts, point, point.get_f64(&key)))
            .collect();

        Self {
            entries,
            half_span: size / 2.0,
            cursor: 0,
        }
    }

    fn window_around(&self, index: usize, center: f64) -> Window<'a> {
        let within = |value: f64| (value - center).abs() <= self.half_span;

        let mut first = index;
        for (i, (_, _, value)) in self.entries[..index].iter().enumerate().rev() {
            match value {
                None => continue,
                Some(v) if within(*v) => first = i,
                Some(_) => break,
            }
        }

        let mut last = index;
        for (i, (_, _, value)) in self.entries.iter().enumerate().skip(index + 1) {
            match value {
                None => continue,
                Some(v) if within(*v) => last = i,
                Some(_) => break,
            }
        }

        self.entries[first..=last]
            .iter()
            .filter(|(_, _, value)| value.is_some())
            .map(|(_, point, _)| *point)
            .collect()
    }
}

impl<'a> Iterator for SlidingWindows<'a> {
    type Item = (OffsetDateTime, &'a Point, Window<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor;
        let (timestamp, point, value) = *self.entries.get(index)?;
        self.cursor += 1;

        let window = match value {
            Some(center) => self.window_around(index, center),
            None => Vec::new(),
        };

        Some((timestamp, point, window))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SlidingWindows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::Value, track::Track};
    use time::{Duration, macros::datetime};

    fn ts(seconds: i64) -> OffsetDateTime {
        datetime!(2024-01-01 12:00:00 UTC) + Duration::seconds(seconds)
    }

    fn distances(window: &Window<'_>) -> Vec<f64> {
        window
            .iter()
            .filter_map(|p| p.get_f64(&PointField::Distance))
            .collect()
    }

    fn track_with_distances(values: &[Option<f64>]) -> Track {
        let mut track = Track::new();
        for (i, value) in values.iter().enumerate() {
            let mut fields = vec![(PointField::Time, Value::from(i as f64))];
            if let Some(d) = value {
                fields.push((PointField::Distance, Value::from(*d)));
            }
            track.upsert_point(ts(i as i64), fields);
        }
        track
    }

    #[test]
    fn test_window_is_symmetric_bound() {
        let track = track_with_distances(&[
            Some(0.0),
            Some(10.0),
            Some(20.0),
            Some(30.0),
            Some(40.0),
        ]);

        let windows: Vec<_> = track
            .sliding_window_iter(PointField::Distance, 20.0)
            .map(|(_, _, w)| distances(&w))
            .collect();

        assert_eq!(windows[0], vec![0.0, 10.0]);
        assert_eq!(windows[2], vec![10.0, 20.0, 30.0]);
        assert_eq!(windows[4], vec![30.0, 40.0]);
    }

    #[test]
    fn test_missing_key_does_not_break_run() {
        let track = track_with_distances(&[Some(0.0), None, Some(5.0), None, Some(9.0)]);

        let windows: Vec<_> = track
            .sliding_window_iter(PointField::Distance, 20.0)
            .map(|(_, _, w)| distances(&w))
            .collect();

        assert_eq!(windows.len(), 5);
        assert_eq!(windows[0], vec![0.0, 5.0, 9.0]);
        assert!(windows[1].is_empty());
        assert_eq!(windows[2], vec![0.0, 5.0, 9.0]);
        assert!(windows[3].is_empty());
    }

    #[test]
    fn test_expansion_stops_at_first_outlier() {
        // not monotonic: 100 blocks the way back to 2
        let track = track_with_distances(&[Some(2.0), Some(100.0), Some(3.0), Some(4.0)]);

        let (_, _, window) = track
            .sliding_window_iter(PointField::Distance, 10.0)
            .nth(2)
            .unwrap();

        assert_eq!(distances(&window), vec![3.0, 4.0]);
    }

    #[test]
    fn test_windows_are_restartable() {
        let track = track_with_distances(&[Some(0.0), Some(1.0)]);

        let windows = track.sliding_window_iter(PointField::Distance, 5.0);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows.clone().count(), 2);
        assert_eq!(track.sliding_window_iter(PointField::Distance, 5.0).count(), 2);
    }

    #[test]
    fn test_empty_track_has_no_windows() {
        let track = Track::new();
        assert_eq!(track.sliding_window_iter(PointField::Time, 5.0).count(), 0);
    }
}
