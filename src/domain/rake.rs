use uuid::Uuid;

/// Status of a rake. Only `Available` rakes are candidates for packing (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RakeStatus {
    Available,
    Assigned,
    InTransit,
    Maintenance,
}

impl RakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RakeStatus::Available => "available",
            RakeStatus::Assigned => "assigned",
            RakeStatus::InTransit => "in_transit",
            RakeStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(RakeStatus::Available),
            "assigned" => Some(RakeStatus::Assigned),
            "in_transit" => Some(RakeStatus::InTransit),
            "maintenance" => Some(RakeStatus::Maintenance),
            _ => None,
        }
    }
}

/// A train of fixed-type wagons, treated as a single dispatch object.
/// Capacity is a hard upper bound on packed tonnage (§3).
#[derive(Clone, Debug)]
pub struct Rake {
    pub id: Uuid,
    pub rake_number: String,
    pub wagon_type_code: String,
    pub num_wagons: i32,
    pub total_capacity_tonnes: f64,
    pub status: RakeStatus,
    pub current_location: Option<String>,
}
