#![doc = "volume-push-core: core logic library for volume-push."]

//! This crate contains the pipeline that archives a source directory into
//! numbered volumes, clones the target repository, copies the volumes into
//! the clone and publishes them.
//!
//! External tools (the archiver and git) sit behind the traits in
//! [`contract`], so the pipeline can be driven by mocks in tests and by the
//! process-backed implementations in [`archive`] and [`vcs`] in production.
//!
//! # Usage
//! Build a [`config::PipelineConfig`], pick implementations of
//! [`contract::Archiver`] and [`contract::VersionControl`], and call
//! [`pipeline::run_pipeline`].

pub mod archive;
pub mod config;
pub mod contract;
pub mod error;
pub mod journal;
pub mod pipeline;
mod process;
pub mod url;
pub mod vcs;
pub mod volumes;
