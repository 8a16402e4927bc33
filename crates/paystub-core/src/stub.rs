use crate::filename::output_file_name;
use crate::items::ItemList;
use crate::totals::{MileagePolicy, compute_totals_with};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything printed on one contractor's pay stub
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PayStub {
    #[cfg_attr(feature = "serde", serde(default))]
    pub contractor: Contractor,
    #[cfg_attr(feature = "serde", serde(default))]
    pub period: PayPeriod,
    #[cfg_attr(feature = "serde", serde(default))]
    pub paid_via: Option<PaymentMethod>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub items: ItemList,
}

impl PayStub {
    pub fn totals(&self, policy: &MileagePolicy) -> Totals {
        compute_totals_with(&self.items, policy)
    }

    /// Name the exported document is saved under
    pub fn file_name(&self) -> String {
        output_file_name(&self.contractor.name, self.period.end, self.period.pay_date)
    }

    /// Load a stub from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let stub = serde_json::from_slice(&bytes)
            .map_err(|e| StubError::Config(format!("Failed to parse pay stub: {}", e)))?;
        Ok(stub)
    }

    /// Save the stub as pretty-printed JSON
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StubError::Config(format!("Failed to serialize pay stub: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
