//! Silicon model for the ETPU convolution accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the accelerator as the SoC bus sees it: window base
//! addresses, slot stride, the packed stream word format and the
//! reference frame protocol.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`windows`] | Weight / stream / readout windows, bases, slot addressing |
//! | [`word`] | Packed word layout (tag byte, three 8-bit lanes) |
//! | [`frame`] | Reference 3×3 frame: access counts, readout span, fixed matrices |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod frame;
pub mod windows;
pub mod word;
