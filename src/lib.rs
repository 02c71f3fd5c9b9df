pub mod aliases;
pub mod config;
pub mod export;
pub mod loader;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod report_export;
pub mod season;
