//! Resource kinds exposed by the generic CRUD surface

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Closed set of tables reachable through `/{resource}` routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Rooms,
    RoomCategories,
    Guests,
    Staff,
    Bookings,
    Payments,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Rooms,
        ResourceKind::RoomCategories,
        ResourceKind::Guests,
        ResourceKind::Staff,
        ResourceKind::Bookings,
        ResourceKind::Payments,
    ];

    /// Table name, also the path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Rooms => "rooms",
            ResourceKind::RoomCategories => "room_categories",
            ResourceKind::Guests => "guests",
            ResourceKind::Staff => "staff",
            ResourceKind::Bookings => "bookings",
            ResourceKind::Payments => "payments",
        }
    }

    /// Human label for a single record, used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Rooms => "Room",
            ResourceKind::RoomCategories => "Room category",
            ResourceKind::Guests => "Guest",
            ResourceKind::Staff => "Staff member",
            ResourceKind::Bookings => "Booking",
            ResourceKind::Payments => "Payment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let normalized = s.replace('-', "_");
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::not_found("Resource", s))
    }
}
