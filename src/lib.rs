//! Batch product importer for a remote commerce catalog.
//!
//! A single run executes five strictly ordered steps: resolve the wholesale
//! customer group, resolve the standard tax category and load the category
//! tree, load the product types, import product drafts from CSV in bounded
//! concurrent chunks, and publish the catalog. Any failure aborts the run;
//! already completed remote writes stand.

pub mod catalog;
pub mod config;
pub mod error;
pub mod job;
pub mod source;
pub mod steps;
