//! Exports: usage CSV and client shortlist PDF.

pub mod shortlist;
pub mod usage_csv;

pub use shortlist::*;
pub use usage_csv::*;

use crate::db::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("PDF error: {0}")]
    Pdf(String),
}
