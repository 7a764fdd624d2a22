//! 1° × 1° scenery area coordinates and their directory names.
//!
//! Scenery is stored in two levels of buckets named after their southwest
//! corner: a 10° bucket and the 1° area inside it.
//!
//! # Naming
//!
//! ```text
//! Terrain/w020s10/w012s05
//!         │       └─ 1° area: lon 12°W, lat 5°S
//!         └───────── 10° bucket: lon 20°W, lat 10°S
//! ```
//!
//! Longitude comes first, with three digits; latitude second, with two.

use std::fmt;

use crate::sync::SyncRequest;

/// Content trees requested for every area. Only the first refreshes the display.
pub const CONTENT_TREES: [&str; 2] = ["Terrain", "Objects"];

/// A 1° × 1° area, named after its southwest corner.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct AreaCoord {
    /// Floor of latitude in degrees.
    pub lat: i32,
    /// Floor of longitude in degrees.
    pub lon: i32,
}

impl AreaCoord {
    /// Create from integer degrees.
    pub const fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Area containing a floating point position (floors to the area boundary).
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// Area shifted by whole degrees, saturating at the `i32` range.
    pub const fn offset(self, dlat: i32, dlon: i32) -> Self {
        Self::new(self.lat.saturating_add(dlat), self.lon.saturating_add(dlon))
    }

    /// True inside lat [-90, 90] and lon [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90..=90).contains(&self.lat) && (-180..=180).contains(&self.lon)
    }

    /// Southwest corner of the enclosing 10° bucket.
    pub fn bucket_base(&self) -> (i32, i32) {
        (self.lat.div_euclid(10) * 10, self.lon.div_euclid(10) * 10)
    }

    /// Relative path of this area below a content tree.
    pub fn bucket_path(&self) -> String {
        let (base_lat, base_lon) = self.bucket_base();
        let ns = if self.lat < 0 { 's' } else { 'n' };
        let ew = if self.lon < 0 { 'w' } else { 'e' };
        format!(
            "{ew}{:03}{ns}{:02}/{ew}{:03}{ns}{:02}",
            base_lon.abs(),
            base_lat.abs(),
            self.lon.abs(),
            self.lat.abs()
        )
    }

    /// Directory of this area inside `tree`.
    pub fn dir(&self, tree: &str) -> String {
        format!("{}/{}", tree, self.bucket_path())
    }

    /// Requests for every content tree, in submission order.
    pub fn requests(&self) -> Vec<SyncRequest> {
        CONTENT_TREES
            .iter()
            .enumerate()
            .map(|(i, tree)| SyncRequest::new(self.dir(tree), i == 0))
            .collect()
    }
}

impl fmt::Display for AreaCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}
