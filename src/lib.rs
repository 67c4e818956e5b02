pub mod analysis;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod mail;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod window;
