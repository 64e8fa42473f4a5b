//! Booking and service catalogue types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SlotlineError};
use crate::impl_domain_status_conversions;

/// Immutable per-query service description, owned by the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProfile {
    pub id: String,
    pub name: String,
    /// Length of the appointment itself, in minutes
    pub duration_min: i64,
    /// Cleanup/preparation time blocked after the appointment, in minutes
    pub buffer_after_min: i64,
}

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl_domain_status_conversions!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no_show"
});

/// A customer appointment for a single service.
///
/// Exactly one booking may own a given `starts_at` instant; the backing
/// store enforces this as a uniqueness constraint (single implicit service
/// provider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub service: ServiceProfile,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new pending booking with a fresh identifier.
    pub fn new(
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
        customer_email: impl Into<String>,
        service: ServiceProfile,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            customer_email: customer_email.into(),
            service,
            starts_at,
            ends_at,
            status: BookingStatus::Pending,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Validate booking invariants at the write boundary.
    pub fn validate(&self) -> Result<()> {
        if self.ends_at <= self.starts_at {
            return Err(SlotlineError::InvalidInput(format!(
                "booking must end after it starts ({} <= {})",
                self.ends_at, self.starts_at
            )));
        }
        Ok(())
    }

    /// End of the interval this booking blocks: the appointment itself plus
    /// its service's trailing buffer.
    pub fn busy_until(&self) -> DateTime<Utc> {
        self.ends_at + chrono::Duration::minutes(self.service.buffer_after_min)
    }
}
