use std::collections::HashMap;
use uuid::Uuid;

/// A storage site holding bulk materials indexed by product code.
///
/// `current_inventory` is the planner's *view* of stock, snapshotted once
/// per run; it is never live ground truth (§3).
#[derive(Clone, Debug)]
pub struct Stockyard {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity_tonnes: f64,
    pub current_inventory: HashMap<String, f64>,
}

impl Stockyard {
    pub fn point(&self) -> Option<crate::distance::GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(crate::distance::GeoPoint { lat, lon }),
            _ => None,
        }
    }
}
