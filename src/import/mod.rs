//! Bulk package import from spreadsheet workbooks.
//!
//! A workbook is read into [`Workbook`] (from `.xlsx`/`.xls` bytes or a JSON
//! document of the same shape), reconciled against the packages already in
//! the store into an [`ImportPlan`], and the plan's new packages are then
//! written one by one.

pub mod reconcile;
pub mod sheets;

pub use reconcile::{
    commit, destination_code, normalize_id, plan_packages, plan_workbook, ImportPlan,
    ImportReport, ImportSummary,
};
pub use sheets::{SheetRow, Workbook};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("invalid JSON workbook: {0}")]
    InvalidJson(String),

    #[error("workbook has no `{0}` sheet")]
    MissingSheet(&'static str),
}

impl From<ImportError> for tripdesk_http::AppError {
    fn from(err: ImportError) -> Self {
        tripdesk_http::AppError::bad_request(err.to_string())
    }
}
