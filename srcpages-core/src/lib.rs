#![doc = "srcpages-core: core logic library for srcpages."]

//! This crate contains the page-budget logic and the supporting pipeline for srcpages:
//! estimating how many printed lines a line of code occupies, fitting a project's sources
//! into a target number of pages, and rendering the result as a PDF listing.
//!
//! # Usage
//! Add this as a dependency for the estimator, pagination engine, discovery and rendering code.
//! The CLI crate only parses arguments and configuration and calls into [`pipeline`].

pub mod collect;
pub mod config;
pub mod contract;
pub mod estimate;
pub mod paginate;
pub mod pipeline;
pub mod project;
pub mod render;
pub mod source;
