//! Normalized equalizer band representation
//!
//! This module provides [`Band`], the common representation of one
//! parametric filter, and [`BandSet`], the bounded ordered collection that
//! a single export produces.

use std::fmt;

use crate::error::TooManyBands;

/// Maximum number of bands taken from one export
pub const MAX_BANDS: usize = 7;

/// Filter shapes understood by the target equalizer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterKind {
    /// Low shelf (`LS`)
    LowShelf,
    /// Peaking / bell (`PK`)
    Peaking,
    /// High shelf (`HS`)
    HighShelf,
    /// Low pass (`LP`)
    LowPass,
    /// High pass (`HP`)
    HighPass,
    /// Code with no known mapping, kept verbatim
    Other(String),
}

impl FilterKind {
    /// Translate a REW filter code
    ///
    /// Codes outside the table are passed through as [`FilterKind::Other`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "LS" => Self::LowShelf,
            "PK" => Self::Peaking,
            "HS" => Self::HighShelf,
            "LP" => Self::LowPass,
            "HP" => Self::HighPass,
            other => Self::Other(other.to_string()),
        }
    }

    /// Name used on the device wire protocol
    pub fn as_str(&self) -> &str {
        match self {
            Self::LowShelf => "LOWSHELF",
            Self::Peaking => "PEAKING",
            Self::HighShelf => "HIGHSHELF",
            Self::LowPass => "LOWPASS",
            Self::HighPass => "HIGHPASS",
            Self::Other(code) => code,
        }
    }

    /// Returns whether the code was found in the translation table
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns whether this shape uses a gain value
    pub fn uses_gain(&self) -> bool {
        matches!(self, Self::LowShelf | Self::Peaking | Self::HighShelf)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parametric equalizer band
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    /// Zero-based band position (`Filter N:` gives `N - 1`)
    pub index: u32,
    /// Filter shape
    pub kind: FilterKind,
    /// Centre/corner frequency, truncated to whole Hz
    pub frequency_hz: u32,
    /// Gain in dB, absent when the line has no gain clause
    pub gain_db: Option<f64>,
    /// Quality factor, absent when the line has no Q clause
    pub q: Option<f64>,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Band {}: {} Freq={}Hz",
            self.index, self.kind, self.frequency_hz
        )?;
        if let Some(gain) = self.gain_db {
            write!(f, ", Gain={}dB", gain)?;
        }
        if let Some(q) = self.q {
            write!(f, ", Q={}", q)?;
        }
        Ok(())
    }
}

/// Ordered bands extracted from one export, never more than [`MAX_BANDS`]
///
/// With the `serde` feature a set serializes as a plain list of bands and
/// refuses to deserialize from a longer one.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Band>", into = "Vec<Band>"))]
pub struct BandSet {
    bands: Vec<Band>,
}

impl BandSet {
    /// Build a set from bands in order, keeping only the first [`MAX_BANDS`]
    pub fn from_bands(bands: impl IntoIterator<Item = Band>) -> Self {
        Self {
            bands: bands.into_iter().take(MAX_BANDS).collect(),
        }
    }

    /// Number of bands
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Returns true if no band was extracted
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Returns true once the set holds [`MAX_BANDS`] bands
    pub fn is_full(&self) -> bool {
        self.bands.len() >= MAX_BANDS
    }

    /// Iterate bands in file order
    pub fn iter(&self) -> std::slice::Iter<'_, Band> {
        self.bands.iter()
    }

    /// Borrow the bands as a slice
    pub fn as_slice(&self) -> &[Band] {
        &self.bands
    }

    pub(crate) fn push(&mut self, band: Band) {
        debug_assert!(!self.is_full());
        self.bands.push(band);
    }
}

impl TryFrom<Vec<Band>> for BandSet {
    type Error = TooManyBands;

    fn try_from(bands: Vec<Band>) -> Result<Self, Self::Error> {
        if bands.len() > MAX_BANDS {
            return Err(TooManyBands { count: bands.len() });
        }
        Ok(Self { bands })
    }
}

impl From<BandSet> for Vec<Band> {
    fn from(set: BandSet) -> Self {
        set.bands
    }
}

impl<'a> IntoIterator for &'a BandSet {
    type Item = &'a Band;
    type IntoIter = std::slice::Iter<'a, Band>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.iter()
    }
}

impl IntoIterator for BandSet {
    type Item = Band;
    type IntoIter = std::vec::IntoIter<Band>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.into_iter()
    }
}
