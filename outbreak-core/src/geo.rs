use serde::{Deserialize, Serialize};

use crate::population::OutbreakPoint;

/// Geographic extent of a raster in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Inclusive on every edge.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat_min <= lat && lat <= self.lat_max && self.lon_min <= lon && lon <= self.lon_max
    }
}

/// GDAL-ordered affine geo transform of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeoTransform {
    pub scale_factor_x: f64,
    #[serde(default)]
    pub shear_y_component_x: f64,
    pub x_translation_term: f64,
    #[serde(default)]
    pub shear_x_component_y: f64,
    pub scale_factor_y: f64,
    pub y_translation_term: f64,
}

impl GeoTransform {
    /// Pixel `(x, y)` of a coordinate, truncated toward zero. Shear terms
    /// are ignored; population rasters are north-up.
    pub fn to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let px_x = (lon - self.x_translation_term) / self.scale_factor_x;
        let px_y = (lat - self.y_translation_term) / self.scale_factor_y;
        (px_x as i64, px_y as i64)
    }
}

/// Fractional position of pixel `(px_x, px_y)` in an image of
/// `width x height` pixels.
pub fn relative_position(px_x: i64, px_y: i64, width: u32, height: u32) -> OutbreakPoint {
    OutbreakPoint::new(px_x as f64 / f64::from(width), px_y as f64 / f64::from(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn north_up() -> GeoTransform {
        GeoTransform {
            scale_factor_x: 0.01,
            shear_y_component_x: 0.0,
            x_translation_term: 149.0,
            shear_x_component_y: 0.0,
            scale_factor_y: -0.01,
            y_translation_term: -35.0,
        }
    }

    #[test]
    fn bbox_edges_are_inclusive() {
        let b = BoundingBox {
            lat_min: 10.0,
            lat_max: 20.0,
            lon_min: 30.0,
            lon_max: 40.0,
        };
        assert!(b.contains(15.0, 35.0));
        assert!(b.contains(10.0, 40.0));
        assert!(!b.contains(50.0, 50.0));
        assert!(!b.contains(15.0, 29.999));
    }

    #[test]
    fn coordinate_maps_to_pixel() {
        // Canberra-ish, 0.282 deg south and 0.128 deg east of the origin.
        let (x, y) = north_up().to_pixel(-35.282, 149.128);
        assert_eq!((x, y), (12, 28));
    }

    #[test]
    fn pixel_truncates_toward_zero() {
        let t = GeoTransform {
            scale_factor_x: 1.0,
            scale_factor_y: 1.0,
            x_translation_term: 0.0,
            y_translation_term: 0.0,
            ..north_up()
        };
        assert_eq!(t.to_pixel(-0.5, 2.9), (2, 0));
    }

    #[test]
    fn transform_reads_kebab_case_keys() {
        let t: GeoTransform = serde_json::from_str(
            r#"{"scale-factor-x": 1, "shear-y-component-x": 0, "x-translation-term": 0,
                "shear-x-component-y": 0, "scale-factor-y": -1, "y-translation-term": 100}"#,
        )
        .unwrap();
        assert_eq!(t.scale_factor_y, -1.0);
        assert_eq!(t.to_pixel(90.0, 5.0), (5, 10));
    }

    #[test]
    fn relative_position_divides_by_image_size() {
        let p = relative_position(50, 25, 200, 100);
        assert_abs_diff_eq!(p.x, 0.25);
        assert_abs_diff_eq!(p.y, 0.25);
    }
}
