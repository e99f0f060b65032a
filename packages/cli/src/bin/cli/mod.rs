pub mod analyze;
pub mod dashboard;
pub mod defect;
pub mod reports;
pub mod settings;
pub mod utils;
