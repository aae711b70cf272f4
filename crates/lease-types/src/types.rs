//! Application snapshot types
//!
//! The intake portal owns these records; the contract-filling layer only
//! reads a snapshot. Every value is kept as the display string the form
//! layer produced, since all of them end up drawn onto the contract as-is.

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ApplicationRecord {
    pub entity_name: String,
    pub trading_name: Option<String>,
    pub abn: Option<String>,
    pub street_address: Option<String>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub directors: Vec<Director>,
    pub guarantors: Vec<Guarantor>,
    pub equipment: Vec<EquipmentItem>,
    pub finance: Option<FinanceTerms>,
    pub bank: Option<BankAccount>,
    /// Free text, wrapped onto the contract over multiple lines.
    pub special_conditions: Option<String>,
    /// PNG bytes captured by the signature pad, if the applicant has signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_png: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Director {
    pub name: String,
    pub position: Option<String>, // e.g. "Director", "Company Secretary"
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Guarantor {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EquipmentItem {
    pub description: String,
    pub serial: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FinanceTerms {
    pub amount_financed: Option<String>,
    pub term_months: Option<String>,
    pub repayment: Option<String>,
    pub frequency: Option<String>, // "Weekly" / "Fortnightly" / "Monthly"
}

/// Direct debit account details, printed on the direct debit request page.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BankAccount {
    pub account_name: String,
    pub bsb: String,
    pub account_number: String,
    pub institution: Option<String>,
}

impl ApplicationRecord {
    /// Single-line postal address as printed on the contract.
    pub fn address_line(&self) -> Option<String> {
        let street = self.street_address.as_deref()?;
        let mut line = street.to_string();
        for part in [
            self.suburb.as_deref(),
            self.state.as_deref(),
            self.postcode.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            line.push(' ');
            line.push_str(part);
        }
        Some(line)
    }
}
