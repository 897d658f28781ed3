//! Billing account domain models
//!
//! A billing account ties an organization to a subscription plan and, once
//! it has been mirrored into the ERP system, to the linked ERP partner
//! records representing it there.

use serde::{Deserialize, Serialize};

/// Subscription plan of a billing account.
///
/// # Examples
///
/// ```
/// use platform_org::Plan;
///
/// assert_eq!(Plan::Free.seat_limit(), Some(1));
/// assert_eq!(Plan::Enterprise.seat_limit(), None);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Free single-seat plan
    #[default]
    Free,

    /// Team plan
    Team,

    /// Enterprise plan
    Enterprise,
}

impl Plan {
    /// Maximum number of members, `None` meaning unlimited.
    pub fn seat_limit(&self) -> Option<u32> {
        match self {
            Plan::Free => Some(1),
            Plan::Team => Some(50),
            Plan::Enterprise => None,
        }
    }

    /// Get string representation of the plan.
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Team => "team",
            Plan::Enterprise => "enterprise",
        }
    }
}

/// IDs of the ERP partner records mirroring a billing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErpLink {
    /// Company partner record ID
    pub company_id: i64,

    /// Invoice-address partner record ID
    pub invoice_id: i64,
}

/// A billing account for one organization.
///
/// # Examples
///
/// ```
/// use platform_org::{BillingAccount, Plan};
///
/// let account = BillingAccount::new("acme", "Acme Corp", "billing@acme.example").with_plan(Plan::Team);
/// assert!(account.within_seat_limit(10));
/// assert!(account.erp.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingAccount {
    /// Organization resource name
    pub organization: String,

    /// Legal name used on invoices
    pub legal_name: String,

    /// Invoice recipient address
    pub billing_email: String,

    /// ISO 4217 currency code
    pub currency: String,

    /// Subscription plan
    #[serde(default)]
    pub plan: Plan,

    /// ERP mirror, once created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erp: Option<ErpLink>,
}

impl BillingAccount {
    /// Creates a free-plan account billed in USD.
    pub fn new(
        organization: impl Into<String>,
        legal_name: impl Into<String>,
        billing_email: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            legal_name: legal_name.into(),
            billing_email: billing_email.into(),
            currency: "USD".to_string(),
            plan: Plan::Free,
            erp: None,
        }
    }

    /// Set the plan.
    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    /// Set the currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Record the ERP partner records mirroring this account.
    pub fn link_erp(&mut self, link: ErpLink) {
        self.erp = Some(link);
    }

    /// Check whether `members` fit the plan.
    pub fn within_seat_limit(&self, members: u32) -> bool {
        self.plan.seat_limit().map_or(true, |limit| members <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_account_defaults() {
        let account = BillingAccount::new("acme", "Acme Corp", "billing@acme.example");
        assert_eq!(account.plan, Plan::Free);
        assert_eq!(account.currency, "USD");
        assert!(account.within_seat_limit(1));
        assert!(!account.within_seat_limit(2));
    }

    #[test]
    fn test_link_erp() {
        let mut account = BillingAccount::new("acme", "Acme Corp", "billing@acme.example")
            .with_plan(Plan::Enterprise)
            .with_currency("EUR");
        account.link_erp(ErpLink {
            company_id: 7,
            invoice_id: 8,
        });

        assert_eq!(account.erp.map(|l| l.invoice_id), Some(8));
        assert!(account.within_seat_limit(10_000));
    }

    #[test]
    fn test_plan_serialization() {
        assert_eq!(serde_json::to_string(&Plan::Team).unwrap(), "\"team\"");
        let account: BillingAccount = serde_json::from_value(serde_json::json!({
            "organization": "acme",
            "legal_name": "Acme Corp",
            "billing_email": "billing@acme.example",
            "currency": "USD"
        }))
        .unwrap();
        assert_eq!(account.plan, Plan::Free);
    }
}
