//! Position-driven prefetch of scenery areas.
//!
//! [`PositionScheduler`] converts observer positions into sync requests for
//! the surrounding 1° areas, named by [`AreaCoord`].

mod bucket;
mod scheduler;

pub use bucket::{AreaCoord, CONTENT_TREES};
pub use scheduler::{plan_areas, request_area, Direction, PositionScheduler};
