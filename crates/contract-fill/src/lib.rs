//! Lease contract filling
//!
//! This crate stamps application data onto the fixed-layout lease contract
//! template: a coordinate registry says where every field lives on which
//! page, and a renderer whites out the pre-printed placeholders and draws
//! the replacement text (or a signature image) in place.
//!
//! Typical use from the portal API layer:
//!
//! ```no_run
//! use contract_fill::{fill_application, loader};
//! use lease_types::ApplicationRecord;
//!
//! # fn run(record: &ApplicationRecord) -> Result<(), contract_fill::FillError> {
//! let template = loader::read_template("templates/lease-contract.pdf")?;
//! let pdf_bytes = fill_application(&template, record)?;
//! # let _ = pdf_bytes;
//! # Ok(())
//! # }
//! ```
//!
//! Each render owns its document: for concurrent renders, build one
//! [`ContractRenderer`] per request.

pub mod apply;
pub mod error;
pub mod fields;
pub mod loader;
pub mod renderer;
pub mod wrap;

pub use apply::{fill_application, fill_application_with};
pub use error::FillError;
pub use fields::{FieldSpec, Rect, Registry, SignatureBlock, Variant};
pub use renderer::ContractRenderer;
