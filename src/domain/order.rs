use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Status of an order in the fulfillment lifecycle.
///
/// Only `Pending` orders are visible to the planner. An order moves to
/// `Assigned` exclusively via plan commit (§4.9); nothing else mutates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Assigned,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Assigned => "assigned",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "assigned" => Some(OrderStatus::Assigned),
            "fulfilled" => Some(OrderStatus::Fulfilled),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// A single transport order pending fulfillment.
///
/// Immutable once it enters a planning run: the planner only reads orders,
/// it never writes them. Commit is the only writer (§4.9).
#[derive(Clone, Debug)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub product_code: String,
    pub quantity_tonnes: f64,
    pub source_stockyard_id: Option<Uuid>,
    pub destination: String,
    pub destination_latitude: Option<f64>,
    pub destination_longitude: Option<f64>,
    pub priority: i32,
    pub due_date: DateTime<Utc>,
    pub sla_hours: f64,
    pub status: OrderStatus,
}

impl Order {
    pub fn destination_point(&self) -> Option<crate::distance::GeoPoint> {
        match (self.destination_latitude, self.destination_longitude) {
            (Some(lat), Some(lon)) => Some(crate::distance::GeoPoint { lat, lon }),
            _ => None,
        }
    }
}
