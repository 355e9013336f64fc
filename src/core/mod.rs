//! Core document types, input payloads and validation.
//!
//! This module provides the value model for Peruvian electronic documents
//! (factura, boleta, credit and debit notes) and the staged validation that
//! turns an untyped [`RawInvoice`] into an immutable [`Invoice`].

mod error;
mod input;
mod ruc;
mod types;
pub mod units;
mod validation;

pub use error::*;
pub use input::*;
pub use ruc::{is_valid_ruc, ruc_check_digit};
pub use types::*;
pub use units::is_known_unit_code;
pub use validation::*;
