//! Report document formatting. Everything here is pure: the caller passes the
//! clock in, so output is reproducible in tests.

pub mod report;

pub use report::{
    AggregateReport, StructuredReport, format_merge_time, render_commit, render_freeform,
};
