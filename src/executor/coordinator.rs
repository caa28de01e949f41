// Coordinate grounding for tap targets.
use crate::perception::types::DeviceGeometry;

/// Clamps a tap target into `[0, width] × [0, height]`.
/// With no known geometry the point is passed through unchanged.
pub fn clamp_to_screen(x: i32, y: i32, geometry: Option<DeviceGeometry>) -> (i32, i32) {
    let Some(geo) = geometry else {
        return (x, y);
    };
    let max_x = i32::try_from(geo.width).unwrap_or(i32::MAX);
    let max_y = i32::try_from(geo.height).unwrap_or(i32::MAX);
    let clamped = (x.clamp(0, max_x), y.clamp(0, max_y));
    if clamped != (x, y) {
        tracing::warn!(x, y, cx = clamped.0, cy = clamped.1, "tap target out of bounds, clamped");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_each_axis_independently() {
        let geo = Some(DeviceGeometry::new(1080, 2400));
        assert_eq!(clamp_to_screen(540, 1200, geo), (540, 1200));
        assert_eq!(clamp_to_screen(-5, 1200, geo), (0, 1200));
        assert_eq!(clamp_to_screen(5000, -1, geo), (1080, 0));
        assert_eq!(clamp_to_screen(1080, 2400, geo), (1080, 2400));
        assert_eq!(clamp_to_screen(i32::MAX, i32::MIN, geo), (1080, 0));
    }

    #[test]
    fn unknown_geometry_passes_through() {
        assert_eq!(clamp_to_screen(-5, 99_999, None), (-5, 99_999));
    }
}
