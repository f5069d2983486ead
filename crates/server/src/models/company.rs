//! Company model.

use serde::{Deserialize, Serialize};

use clientele_core::CompanyId;

/// A company in the local directory.
///
/// `name` doubles as the natural key during reconciliation: a synced company
/// is matched by exact name, never re-created under a second row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    /// Local identifier (generated on creation).
    pub id: CompanyId,
    /// Company name (de-facto matching key for sync).
    pub name: String,
    /// Address line 1.
    pub address1: String,
    /// Address line 2.
    pub address2: String,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: String,
}

/// The address fields a sync pass writes onto a company.
///
/// Kept separate from [`Company`] because the reconciler overwrites exactly
/// these four fields, never the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyAddress {
    /// Address line 1.
    pub address1: String,
    /// Address line 2.
    pub address2: String,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: String,
}
