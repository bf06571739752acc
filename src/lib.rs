pub mod airspace;
pub mod analysis;
pub mod app;
pub mod config;
pub mod cycle;
pub mod error;
pub mod fs_util;
pub mod locations;
pub mod nasr;
pub mod output;
pub mod report;
pub mod resolver;
pub mod store;
