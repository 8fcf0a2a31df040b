//! Skywave Core - DSP primitives for the radio voice stack
//!
//! This crate provides the foundational building blocks shared by every stage
//! of the radio simulation: the fixed frame format, the sample-producer and
//! frame-effect traits, and the small DSP structures (biquad sections,
//! envelope follower, rolling meter window) the effect chain is assembled
//! from.
//!
//! # Core Abstractions
//!
//! ## Frame Format
//!
//! All audio moves through the stack as fixed 20 ms mono frames of 32-bit
//! float samples at 48 kHz ([`FRAME_SIZE_SAMPLES`] = 960). See [`frame`] for
//! the constants and the slice helpers (mixing, interleaving, peak scan).
//!
//! ## Producers and Effects
//!
//! - [`SampleSource`] - pull-based producer yielding one frame per call
//! - [`SourceStatus`] - per-pull outcome (`Ok` / `EndOfStream` / `NoData`)
//! - [`Effect`] - in-place frame transform (filters, dynamics)
//!
//! ## DSP Building Blocks
//!
//! - [`Biquad`] - second-order IIR section with normalized coefficients
//! - [`EnvelopeFollower`] - amplitude tracking for dynamics processing
//! - [`RollingAverage`] - fixed-window average/max for VU metering
//! - Math helpers: [`db_to_linear`], [`linear_to_db`], [`hard_clip`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! skywave-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocation in any processing path
//! - **Deterministic**: identical input always produces identical output
//! - **Object-safe traits**: effect sources behind radio slots use dynamic
//!   dispatch only where the chain is genuinely heterogeneous

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod effect;
pub mod envelope;
pub mod frame;
pub mod math;
pub mod rolling;
pub mod source;

pub use biquad::Biquad;
pub use effect::Effect;
pub use envelope::EnvelopeFollower;
pub use frame::{
    FRAME_LENGTH_MS, FRAME_SIZE_SAMPLES, Frame, SAMPLE_RATE_HZ, interleave, mix_into, peak,
    silent_frame,
};
pub use math::{db_to_linear, hard_clip, linear_to_db};
pub use rolling::RollingAverage;
pub use source::{SampleSource, SourceStatus};
