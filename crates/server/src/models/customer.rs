//! Customer model.

use serde::{Deserialize, Serialize};

use clientele_core::CustomerId;

use super::Company;

/// A customer in the local directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Local identifier (generated on creation).
    pub id: CustomerId,
    /// Directory identifier. `None` for customers created locally through
    /// the API; unique when present.
    pub external_id: Option<String>,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Associated companies.
    pub companies: Vec<Company>,
}

/// The contact fields a sync pass writes onto a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFields {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
}
