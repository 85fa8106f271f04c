//! Great-circle distance between two points, with a documented fallback
//! for missing geocoding (§4.1, C1).

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance used when either endpoint lacks coordinates. Missing geocoding
/// must not abort planning, so a fixed proxy distance is substituted.
pub const DEFAULT_DISTANCE_KM: f64 = 500.0;

#[derive(Clone, Copy, Debug)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    c * EARTH_RADIUS_KM
}

/// Distance in kilometres between `a` and `b`. Falls back to
/// `DEFAULT_DISTANCE_KM` when either point is missing coordinates.
pub fn distance_km(a: Option<GeoPoint>, b: Option<GeoPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => haversine_km(a, b),
        _ => DEFAULT_DISTANCE_KM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_distance() {
        let p = GeoPoint { lat: 28.6, lon: 77.2 };
        assert!(distance_km(Some(p), Some(p)) < 1e-6);
    }

    #[test]
    fn missing_coordinates_use_fallback() {
        let p = GeoPoint { lat: 28.6, lon: 77.2 };
        assert_eq!(distance_km(None, Some(p)), DEFAULT_DISTANCE_KM);
        assert_eq!(distance_km(Some(p), None), DEFAULT_DISTANCE_KM);
        assert_eq!(distance_km(None, None), DEFAULT_DISTANCE_KM);
    }

    #[test]
    fn delhi_to_mumbai_is_roughly_right() {
        // Sanity check against a well-known great-circle distance (~1150km).
        let delhi = GeoPoint { lat: 28.6139, lon: 77.2090 };
        let mumbai = GeoPoint { lat: 19.0760, lon: 72.8777 };
        let d = distance_km(Some(delhi), Some(mumbai));
        assert!((1100.0..1200.0).contains(&d), "got {d}");
    }
}
