//! SeaWatch Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction that lets the SeaWatch
//! simulation controller run against either the **real** clock (tokio) or a
//! **virtual** clock driven by a test harness.
//!
//! # Core Concept
//!
//! The two ambient dependencies of a maritime scenario are intercepted:
//! - Time (`now()`, `sleep()`)
//! - Randomness (`derive_rng()`)
//!
//! By deriving every random stream from a single 64-bit seed, any odd
//! scenario becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use seawatch_env::SeaWatchContext;
//!
//! async fn interval_loop<Ctx: SeaWatchContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(2000)).await;
//!         tick();
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::SeaWatchContext;
pub use tokio_impl::TokioContext;
