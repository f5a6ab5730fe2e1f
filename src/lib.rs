//! Fills in EICR Rectification Forms from work-order exports.
//!
//! A dataset of work orders is imported from CSV, one order is looked up by
//! its `WO #`, and the problem description is split into the EDN, DB
//! identifier and work text the form asks for. The filled form is exported as
//! a two-page, print-ready workbook.

pub mod dataset;
pub mod error;
pub mod export;
pub mod gate;
pub mod init;
pub mod model;
pub mod parser;
pub mod session;

pub use error::{FormError, Result};
pub use model::{FormField, FormState, ImageSlot, ParsedFields, RawRecord};
pub use parser::{map_record_to_fields, parse_description};
pub use session::FormSession;
