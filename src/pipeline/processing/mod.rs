// Pipeline processing: the app and review cleaners

pub mod apps;
pub mod reviews;

pub use apps::{AppCleanOutput, AppCleanSummary, AppTableCleaner};
pub use reviews::{ReviewCleanOutput, ReviewCleanSummary, ReviewTableCleaner};
