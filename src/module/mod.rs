//! Runnable modules each bundling a job and providing a unified configuration

pub mod options;

pub mod consumer;
pub mod publisher;
pub mod reclaimer;
