//! Core type definitions for cloudplan
//!
//! - Command: one unit of work with args, rationale, declared outputs and an
//!   optional completion condition
//! - Plan: ordered list of commands produced by an external planner
//! - Placeholder helpers: `<UPPER_SNAKE>` references between commands

mod command;
mod duration;
mod placeholder;
mod plan;

pub use command::{Command, WaitFor};
pub use duration::parse_duration;
pub use placeholder::{
    apply_bindings, is_placeholder_key, placeholder, placeholder_keys, render_template, Bindings,
};
pub use plan::Plan;
