//! REW Equalizer Export Library
//!
//! This crate extracts parametric equalizer bands from the text filter
//! settings that Room EQ Wizard (REW) exports:
//!
//! ```text
//! Filter Settings file
//!
//! Equaliser: Generic
//! Filter  1: ON  PK       Fc   63.0 Hz  Gain  -3.5 dB  Q  2.000
//! Filter  2: OFF PK       Fc  120.0 Hz  Gain   1.0 dB  Q  1.000
//! Filter  3: ON  LP       Fc 18000 Hz
//! ```
//!
//! # Architecture
//!
//! - [`band`] holds the normalized model: [`Band`], [`FilterKind`] and the
//!   bounded [`BandSet`]
//! - [`parser`] matches single lines and walks line sources, stopping as
//!   soon as [`MAX_BANDS`] bands have been collected
//!
//! Lines that are not active filter definitions (headers, notes, `OFF`
//! filters) are skipped. A line that does match but carries a malformed
//! number is an error.
//!
//! # Example
//!
//! ```rust
//! use rew_eq::{parse_str, FilterKind};
//!
//! let bands = parse_str("Filter 3: ON PK Fc 120.5Hz Gain -2.3dB Q 0.70\n").unwrap();
//! let band = &bands.as_slice()[0];
//!
//! assert_eq!(band.index, 2);
//! assert_eq!(band.kind, FilterKind::Peaking);
//! assert_eq!(band.frequency_hz, 120);
//! assert_eq!(band.gain_db, Some(-2.3));
//! ```

pub mod band;
pub mod error;
pub mod parser;

pub use band::{Band, BandSet, FilterKind, MAX_BANDS};
pub use error::{ExtractError, ParseError, TooManyBands};
pub use parser::{parse_filter_line, parse_lines, parse_reader, parse_str};
