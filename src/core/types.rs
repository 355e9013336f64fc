use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// IGV (general sales tax) rate applied to taxable operations.
pub const IGV_RATE: Decimal = dec!(0.18);

/// Maximum difference accepted when reconciling monetary amounts.
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Round half away from zero to two decimals.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Catalog 01: electronic document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// 01: Factura.
    Invoice,
    /// 03: Boleta de venta.
    Receipt,
    /// 07: Nota de crédito.
    CreditNote,
    /// 08: Nota de débito.
    DebitNote,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "01",
            Self::Receipt => "03",
            Self::CreditNote => "07",
            Self::DebitNote => "08",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Invoice),
            "03" => Some(Self::Receipt),
            "07" => Some(Self::CreditNote),
            "08" => Some(Self::DebitNote),
            _ => None,
        }
    }

    /// Credit and debit notes amend a previously issued invoice or receipt.
    pub fn is_note(&self) -> bool {
        matches!(self, Self::CreditNote | Self::DebitNote)
    }
}

/// Catalog 06: identity document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityType {
    /// 0: Non-domiciled, no RUC.
    NonDomiciled,
    /// 1: DNI (national identity card).
    Dni,
    /// 4: Foreigner's card.
    ForeignerCard,
    /// 6: RUC (taxpayer registry number).
    Ruc,
    /// 7: Passport.
    Passport,
    /// A: Diplomatic identity card.
    Diplomatic,
}

impl IdentityType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NonDomiciled => "0",
            Self::Dni => "1",
            Self::ForeignerCard => "4",
            Self::Ruc => "6",
            Self::Passport => "7",
            Self::Diplomatic => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(Self::NonDomiciled),
            "1" => Some(Self::Dni),
            "4" => Some(Self::ForeignerCard),
            "6" => Some(Self::Ruc),
            "7" => Some(Self::Passport),
            "A" => Some(Self::Diplomatic),
            _ => None,
        }
    }
}

/// Document currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Pen,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pen => "PEN",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PEN" => Some(Self::Pen),
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }
}

/// Payment terms reported in `cac:PaymentTerms` (`FormaPago`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentTerms {
    #[default]
    Cash,
    Credit,
}

impl PaymentTerms {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Contado",
            Self::Credit => "Credito",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "contado" => Some(Self::Cash),
            "credito" | "crédito" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// Registered address of a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// INEI geographic code (6 digits).
    pub ubigeo: String,
    pub line: String,
    pub district: String,
    pub province: String,
    pub department: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
}

/// Issuer or customer of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id_type: IdentityType,
    pub id: String,
    pub legal_name: String,
    pub address: Option<Address>,
}

/// A single document line. Amounts exclude tax unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub quantity: Decimal,
    /// UN/ECE Recommendation 20 unit code (e.g. "NIU", "ZZ").
    pub unit_code: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// IGV charged on this line.
    pub tax_amount: Decimal,
    pub description: String,
    pub product_code: Option<String>,
    /// UNSPSC commodity classification.
    pub classification: Option<String>,
}

impl LineItem {
    /// Unit price including IGV (catalog 16, price type 01).
    pub fn unit_price_with_tax(&self) -> Decimal {
        round_amount(self.unit_price * (Decimal::ONE + IGV_RATE))
    }
}

/// The document a credit or debit note amends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    /// `SERIES-NUMBER` of the amended document.
    pub id: String,
    pub document_type: DocumentType,
    /// Catalog 09 (credit) or catalog 10 (debit) reason code.
    pub reason_code: String,
    pub description: String,
}

/// A validated electronic document.
///
/// Only [`validate_invoice`](super::validate_invoice) produces values of this
/// type; every invariant checked there holds for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct Invoice {
    pub document_type: DocumentType,
    /// One or two uppercase letters followed by three digits (e.g. "F001").
    pub series: String,
    /// Zero-padded to exactly eight digits.
    pub number: String,
    pub issue_date: NaiveDate,
    pub issue_time: NaiveTime,
    pub due_date: NaiveDate,
    pub currency: Currency,
    pub payment_terms: PaymentTerms,
    pub issuer: Party,
    pub customer: Party,
    pub lines: Vec<LineItem>,
    /// Sum of line totals (operaciones gravadas).
    pub gross_taxable: Decimal,
    pub tax: Decimal,
    pub tax_inclusive: Decimal,
    pub payable: Decimal,
    pub reference: Option<DocumentReference>,
}

impl Invoice {
    /// Document identifier as printed on the document (`F001-00000123`).
    pub fn document_id(&self) -> String {
        format!("{}-{}", self.series, self.number)
    }
}
