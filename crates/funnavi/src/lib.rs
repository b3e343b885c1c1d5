//! Reservation workflow engine for the fun navi facility booking site.
//!
//! The crate resolves target dates, drives the site's search form through a
//! [`browser::BrowserSession`], and classifies the outcome of availability
//! checks, lottery applications, and reservation history reads.

pub mod browser;
pub mod calendar;
pub mod config;
pub mod error;
pub mod report;
pub mod telemetry;
pub mod workflows;
