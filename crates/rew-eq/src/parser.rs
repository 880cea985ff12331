//! REW filter line parser
//!
//! A band-defining line looks like:
//!
//! ```text
//! Filter <N>: ON <CODE> Fc <freq>[ ]Hz[ Gain <gain>[ ]dB][ Q <q>]
//! ```
//!
//! Only the prefix has to match; anything after the last recognised clause
//! is ignored. Whitespace between tokens may be any run of spaces or tabs,
//! which is what REW emits when it column-aligns the export.

use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, trace, warn};

use crate::band::{Band, BandSet, FilterKind};
use crate::error::{ExtractError, ParseError};

const FILTER_LINE_PATTERN: &str = r"^Filter\s+([0-9]+):\s+ON\s+([A-Z]+)\s+Fc\s+([0-9.]+)\s*Hz(?:\s+Gain\s+([-0-9.]+)\s*dB)?(?:\s+Q\s+([0-9.]+))?";

static FILTER_LINE: OnceLock<Regex> = OnceLock::new();

fn filter_line_regex() -> &'static Regex {
    FILTER_LINE.get_or_init(|| Regex::new(FILTER_LINE_PATTERN).expect("valid filter line pattern"))
}

/// Parse a single line
///
/// Returns `Ok(None)` for any line that is not an active filter definition,
/// `Ok(Some(band))` for a matching line, and an error when a matching line
/// carries a number that cannot be converted.
pub fn parse_filter_line(line: &str) -> Result<Option<Band>, ParseError> {
    let Some(caps) = filter_line_regex().captures(line.trim()) else {
        return Ok(None);
    };
    band_from_captures(&caps).map(Some)
}

fn band_from_captures(caps: &Captures<'_>) -> Result<Band, ParseError> {
    let number = &caps[1];
    let index = number
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| ParseError::InvalidFilterNumber(number.into()))?;

    let kind = FilterKind::from_code(&caps[2]);

    let freq_str = &caps[3];
    let freq = freq_str
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidFrequency(freq_str.into()))?;
    if freq > f64::from(u32::MAX) {
        return Err(ParseError::InvalidFrequency(freq_str.into()));
    }
    // Truncation, not rounding: 120.9 Hz becomes 120 Hz.
    let frequency_hz = freq as u32;

    let gain_db = caps
        .get(4)
        .map(|m| {
            m.as_str()
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidGain(m.as_str().into()))
        })
        .transpose()?;

    let q = caps
        .get(5)
        .map(|m| {
            m.as_str()
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidQ(m.as_str().into()))
        })
        .transpose()?;

    Ok(Band {
        index,
        kind,
        frequency_hz,
        gain_db,
        q,
    })
}

/// Walk a fallible line source, stopping once the set is full
fn extract<I, S>(lines: I) -> Result<BandSet, ExtractError>
where
    I: IntoIterator<Item = io::Result<S>>,
    S: AsRef<str>,
{
    let mut bands = BandSet::default();

    for (i, line) in lines.into_iter().enumerate() {
        let line = line?;
        let line = line.as_ref();
        let line_no = i + 1;

        match parse_filter_line(line) {
            Ok(Some(band)) => {
                debug!("line {}: {}", line_no, band);
                if !band.kind.is_known() {
                    debug!("line {}: unmapped filter code {}", line_no, band.kind);
                } else if band.gain_db.is_some() && !band.kind.uses_gain() {
                    warn!("line {}: {} filter ignores its gain", line_no, band.kind);
                }
                bands.push(band);
                if bands.is_full() {
                    debug!("band limit reached at line {}", line_no);
                    break;
                }
            }
            Ok(None) => trace!("line {}: skipped {:?}", line_no, line),
            Err(source) => {
                return Err(ExtractError::Line {
                    line: line_no,
                    source,
                })
            }
        }
    }

    Ok(bands)
}

/// Extract bands from a sequence of lines
///
/// Lines after the seventh band are never looked at, so a malformed line
/// there does not cause an error.
pub fn parse_lines<I, S>(lines: I) -> Result<BandSet, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extract(lines.into_iter().map(Ok))
}

/// Extract bands from text content
pub fn parse_str(content: &str) -> Result<BandSet, ExtractError> {
    parse_lines(content.lines())
}

/// Extract bands from a buffered reader
///
/// Reading stops as soon as the seventh band has been accepted.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<BandSet, ExtractError> {
    extract(reader.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::MAX_BANDS;

    const REW_EXPORT: &str = "\
Filter Settings file

Room EQ V5.20
Dated: 12-Mar-2024 21:14:02

Notes:

Equaliser: Generic
Average 1
Filter  1: ON  PK       Fc   63.0 Hz  Gain  -3.5 dB  Q  2.000
Filter  2: OFF PK       Fc  120.0 Hz  Gain   1.0 dB  Q  1.000
Filter  3: ON  LS       Fc  105.0 Hz  Gain   4.0 dB  Q  0.710
Filter  4: ON  None
Filter  5: ON  HP       Fc   20.0 Hz
";

    #[test]
    fn test_peaking_with_all_clauses() {
        let band = parse_filter_line("Filter 3: ON PK Fc 120.5Hz Gain -2.3dB Q 0.70")
            .unwrap()
            .unwrap();
        assert_eq!(
            band,
            Band {
                index: 2,
                kind: FilterKind::Peaking,
                frequency_hz: 120,
                gain_db: Some(-2.3),
                q: Some(0.70),
            }
        );
    }

    #[test]
    fn test_pass_filter_without_gain_or_q() {
        let band = parse_filter_line("Filter 1: ON LP Fc 80Hz").unwrap().unwrap();
        assert_eq!(
            band,
            Band {
                index: 0,
                kind: FilterKind::LowPass,
                frequency_hz: 80,
                gain_db: None,
                q: None,
            }
        );
    }

    #[test]
    fn test_q_without_gain() {
        let band = parse_filter_line("Filter 2: ON HP Fc 30 Hz Q 0.5")
            .unwrap()
            .unwrap();
        assert_eq!(band.gain_db, None);
        assert_eq!(band.q, Some(0.5));
    }

    #[test]
    fn test_gain_without_q() {
        let band = parse_filter_line("Filter 4: ON HS Fc 8000 Hz Gain 2 dB")
            .unwrap()
            .unwrap();
        assert_eq!(band.kind, FilterKind::HighShelf);
        assert_eq!(band.gain_db, Some(2.0));
        assert_eq!(band.q, None);
    }

    #[test]
    fn test_off_filter_is_skipped() {
        assert_eq!(
            parse_filter_line("Filter 2: OFF PK Fc 500Hz Gain 1.0dB").unwrap(),
            None
        );
    }

    #[test]
    fn test_non_filter_lines_are_skipped() {
        for line in [
            "",
            "Filter Settings file",
            "Equaliser: Generic",
            "Filter  4: ON  None",
            "filter 1: ON PK Fc 100 Hz",
            "Filter 1: ON pk Fc 100 Hz",
            "Filter 1: ON PK Fc 100",
            "Filter x: ON PK Fc 100 Hz",
        ] {
            assert_eq!(parse_filter_line(line).unwrap(), None, "{:?}", line);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let band = parse_filter_line("   \tFilter 1: ON PK Fc 100 Hz Gain 1 dB Q 1\r")
            .unwrap()
            .unwrap();
        assert_eq!(band.index, 0);
    }

    #[test]
    fn test_frequency_is_truncated() {
        let band = parse_filter_line("Filter 1: ON PK Fc 99.99 Hz").unwrap().unwrap();
        assert_eq!(band.frequency_hz, 99);
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let band = parse_filter_line("Filter 1: ON NO Fc 100 Hz").unwrap().unwrap();
        assert_eq!(band.kind, FilterKind::Other("NO".into()));
    }

    #[test]
    fn test_malformed_numbers_in_matching_line() {
        assert_eq!(
            parse_filter_line("Filter 1: ON PK Fc 1.2.3 Hz"),
            Err(ParseError::InvalidFrequency("1.2.3".into()))
        );
        assert_eq!(
            parse_filter_line("Filter 1: ON PK Fc 100 Hz Gain -1-2 dB"),
            Err(ParseError::InvalidGain("-1-2".into()))
        );
        assert_eq!(
            parse_filter_line("Filter 1: ON PK Fc 100 Hz Gain 1 dB Q ."),
            Err(ParseError::InvalidQ(".".into()))
        );
        assert_eq!(
            parse_filter_line("Filter 0: ON PK Fc 100 Hz"),
            Err(ParseError::InvalidFilterNumber("0".into()))
        );
    }

    #[test]
    fn test_rew_export() {
        let bands = parse_str(REW_EXPORT).unwrap();
        let indexes: Vec<u32> = bands.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 2, 4]);

        let kinds: Vec<&FilterKind> = bands.iter().map(|b| &b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &FilterKind::Peaking,
                &FilterKind::LowShelf,
                &FilterKind::HighPass
            ]
        );
        assert_eq!(bands.as_slice()[1].q, Some(0.71));
    }

    #[test]
    fn test_no_active_filters_is_empty() {
        let bands = parse_str("Filter Settings file\nFilter 1: OFF PK Fc 100 Hz\n").unwrap();
        assert!(bands.is_empty());
    }

    #[test]
    fn test_stops_after_seven_bands() {
        let mut content = String::new();
        for n in 1..=7 {
            content.push_str(&format!("Filter {}: ON PK Fc {}00 Hz Gain 1 dB Q 1\n", n, n));
        }
        // Would fail if it were ever inspected.
        content.push_str("Filter 8: ON PK Fc 1.2.3 Hz\n");
        content.push_str("Filter 9: ON PK Fc 900 Hz\n");

        let bands = parse_str(&content).unwrap();
        assert_eq!(bands.len(), MAX_BANDS);
        assert_eq!(bands.as_slice()[6].index, 6);
    }

    #[test]
    fn test_error_reports_line_number() {
        let err = parse_str("header\nFilter 1: ON PK Fc 1..0 Hz\n").unwrap_err();
        match err {
            ExtractError::Line { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source, ParseError::InvalidFrequency("1..0".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reader_stops_consuming_at_limit() {
        struct Counting<'a> {
            lines: std::slice::Iter<'a, &'a str>,
            read: &'a std::cell::Cell<usize>,
        }
        impl Iterator for Counting<'_> {
            type Item = io::Result<String>;
            fn next(&mut self) -> Option<Self::Item> {
                self.read.set(self.read.get() + 1);
                self.lines.next().map(|l| Ok(l.to_string()))
            }
        }

        let lines: Vec<&str> = vec!["Filter 1: ON PK Fc 100 Hz"; 12];
        let read = std::cell::Cell::new(0);
        let bands = extract(Counting {
            lines: lines.iter(),
            read: &read,
        })
        .unwrap();

        assert_eq!(bands.len(), MAX_BANDS);
        assert_eq!(read.get(), MAX_BANDS);
    }

    #[test]
    fn test_reader_propagates_io_error() {
        let lines = vec![
            Ok("Filter 1: ON PK Fc 100 Hz".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad utf-8")),
        ];
        let err = extract(lines).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
        assert!(err.parse_error().is_none());
    }

    #[test]
    fn test_parse_reader() {
        let bands = parse_reader(io::Cursor::new(REW_EXPORT)).unwrap();
        assert_eq!(bands, parse_str(REW_EXPORT).unwrap());
    }

    #[test]
    fn test_parse_is_repeatable() {
        assert_eq!(parse_str(REW_EXPORT).unwrap(), parse_str(REW_EXPORT).unwrap());
    }
}
