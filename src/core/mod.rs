//! Core module - configuration, run control, dispatch and host events

pub mod config;
pub mod control;
pub mod dispatch;
pub mod events;
