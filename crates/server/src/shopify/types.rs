//! Canonical shapes for records read from the directory feed.
//!
//! These are rebuilt from scratch on every pass; nothing here is persisted
//! directly. Absent scalar fields are normalized to empty strings (matching
//! what the local store holds), except the address's company name, where
//! absence is meaningful: no company name, no company association.

/// A customer as reported by the external directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCustomer {
    /// The directory's stable identifier (opaque, e.g. a `gid://` string).
    pub external_id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Addresses in directory order. Order matters: when two addresses name
    /// the same company, the later one wins.
    pub addresses: Vec<ExternalAddress>,
}

/// An address attached to an external customer record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalAddress {
    /// Address line 1.
    pub address1: String,
    /// Address line 2.
    pub address2: String,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: String,
    /// Free-text company name, if the directory has one for this address.
    pub company: Option<String>,
}

impl ExternalAddress {
    /// The company name this address contributes, if any.
    ///
    /// Empty names are treated the same as absent ones: such an address
    /// produces no company association.
    #[must_use]
    pub fn company_name(&self) -> Option<&str> {
        self.company.as_deref().filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_name_absent() {
        let address = ExternalAddress::default();
        assert_eq!(address.company_name(), None);
    }

    #[test]
    fn test_company_name_empty_is_absent() {
        let address = ExternalAddress {
            company: Some(String::new()),
            ..ExternalAddress::default()
        };
        assert_eq!(address.company_name(), None);
    }

    #[test]
    fn test_company_name_present() {
        let address = ExternalAddress {
            company: Some("Acme".to_string()),
            ..ExternalAddress::default()
        };
        assert_eq!(address.company_name(), Some("Acme"));
    }
}
