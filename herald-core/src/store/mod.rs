pub mod github;
pub mod traits;

pub use traits::ReportStore;
