//! Adapter utilities for the `lazyview` crate.
//!
//! The `lazyview` crate is UI-agnostic and callback-free: mutators queue events and load
//! requests. This crate provides small, framework-neutral helpers hosts commonly need on top:
//!
//! - A callback [`Dispatcher`] that drains events and services lazy loads
//! - A [`Controller`] that animates offset changes according to the viewport's scroll mode
//! - Scroll anchoring across content replacement (e.g. prepend in chat/timelines)
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod anchor;
mod controller;
mod dispatch;
mod tween;

#[cfg(test)]
mod tests;

pub use anchor::{ScrollAnchor, set_items_anchored};
pub use controller::Controller;
pub use dispatch::{Dispatcher, PumpReport, install_search};
pub use tween::{Easing, Tween};
