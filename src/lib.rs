pub mod config;
pub mod lineage_core;
