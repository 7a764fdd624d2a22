//! Turns position updates into area sync requests.
//!
//! The first position (or a position after [`PositionScheduler::reset`])
//! requests the full 3 × 3 neighborhood. Later moves request only the row
//! or column of areas ahead of the direction of travel. The current area is
//! always submitted last so the LIFO queue serves it first.

use tracing::debug;

use super::bucket::AreaCoord;
use crate::sync::RequestSink;

/// Movement direction per axis, each component in {-1, 0, 1}.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Direction {
    pub lat: i32,
    pub lon: i32,
}

impl Direction {
    /// Direction of travel from `from` to `to`.
    pub fn between(from: AreaCoord, to: AreaCoord) -> Self {
        Self {
            lat: to.lat.saturating_sub(from.lat).signum(),
            lon: to.lon.saturating_sub(from.lon).signum(),
        }
    }

    pub fn is_stationary(&self) -> bool {
        self.lat == 0 && self.lon == 0
    }
}

/// Remembers the last scheduled area.
#[derive(Debug, Default)]
pub struct PositionScheduler {
    last: Option<AreaCoord>,
}

impl PositionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last scheduled area, if any.
    pub fn last_position(&self) -> Option<AreaCoord> {
        self.last
    }

    /// Forget the last position; the next update requests the full neighborhood.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Request areas around integer position (`lat`, `lon`).
    ///
    /// Returns `false` without requesting anything when the position equals
    /// the last one.
    pub fn schedule_position(&mut self, lat: i32, lon: i32, sink: &dyn RequestSink) -> bool {
        let current = AreaCoord::new(lat, lon);
        if self.last == Some(current) {
            return false;
        }

        let direction = self
            .last
            .map(|last| Direction::between(last, current))
            .unwrap_or_default();

        debug!(
            lat,
            lon,
            lat_dir = direction.lat,
            lon_dir = direction.lon,
            "Requesting scenery update for position"
        );

        for area in plan_areas(current, direction) {
            request_area(area, sink);
        }

        self.last = Some(current);
        true
    }

    /// Like [`schedule_position`](Self::schedule_position) for a floating
    /// point position, floored to whole degrees.
    pub fn schedule_location(&mut self, lat: f64, lon: f64, sink: &dyn RequestSink) -> bool {
        let area = AreaCoord::from_lat_lon(lat, lon);
        self.schedule_position(area.lat, area.lon, sink)
    }
}

/// Areas to request for `current`, in submission order.
///
/// Out-of-range areas are included; [`request_area`] skips them.
pub fn plan_areas(current: AreaCoord, direction: Direction) -> Vec<AreaCoord> {
    let mut areas = Vec::with_capacity(9);

    if direction.is_stationary() {
        for dlat in -1..=1 {
            for dlon in -1..=1 {
                if dlat != 0 || dlon != 0 {
                    areas.push(current.offset(dlat, dlon));
                }
            }
        }
    } else {
        if direction.lat != 0 {
            areas.push(current.offset(direction.lat, -1));
            areas.push(current.offset(direction.lat, 1));
            areas.push(current.offset(direction.lat, 0));
        }
        if direction.lon != 0 {
            areas.push(current.offset(-1, direction.lon));
            areas.push(current.offset(1, direction.lon));
            areas.push(current.offset(0, direction.lon));
        }
    }

    areas.push(current);
    areas
}

/// Submit every content tree of `area`, skipping areas outside the globe.
pub fn request_area(area: AreaCoord, sink: &dyn RequestSink) {
    if !area.is_valid() {
        return;
    }
    for request in area.requests() {
        sink.request(request);
    }
}
