//! Vehicle record owned by the user-management side of the system.

/// Read-only view of a registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub id: i32,
    pub user_id: i32,
    pub plate_number: String,
    /// Matched against slot and floor vehicle-type tags (e.g. "Roda Dua").
    pub vehicle_type: String,
}
