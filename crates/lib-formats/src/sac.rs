//! SAC (Seismic Analysis Code) binary traces.
//!
//! A version 6 file is a fixed 632-byte header followed by `npts` 32-bit
//! samples:
//!
//! | bytes     | contents                     |
//! |-----------|------------------------------|
//! | 0..280    | 70 `f32` words               |
//! | 280..440  | 40 `i32` words (words 70..110) |
//! | 440..632  | 8- and 16-byte text fields   |
//!
//! Files are read in either byte order (detected from `nvhdr`) and written
//! little-endian. Undefined numeric fields hold `-12345`, undefined text
//! fields `-12345` padded with spaces.

use crate::error::ParseError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use lib_types::timeseries::{TimeSeries, TraceStats};
use lib_types::units::Seconds;
use std::path::Path;

/// Header size in bytes.
pub const HEADER_LEN: usize = 632;

/// Header version this codec reads and writes.
pub const HEADER_VERSION: i32 = 6;

const UNDEFINED_F: f32 = -12345.0;
const UNDEFINED_I: i32 = -12345;
const UNDEFINED_K: &str = "-12345";

// Float words.
const DELTA: usize = 0;
const DEPMIN: usize = 1;
const DEPMAX: usize = 2;
const B: usize = 5;
const E: usize = 6;
const DEPMEN: usize = 56;

// Integer words (absolute word index).
const NZYEAR: usize = 70;
const NZJDAY: usize = 71;
const NZHOUR: usize = 72;
const NZMIN: usize = 73;
const NZSEC: usize = 74;
const NZMSEC: usize = 75;
const NVHDR: usize = 76;
const NPTS: usize = 79;
const IFTYPE: usize = 85;
const LEVEN: usize = 105;
const LPSPOL: usize = 106;
const LOVROK: usize = 107;
const LCALDA: usize = 108;

const ITIME: i32 = 1;

// Text fields: (byte offset, width).
const KSTNM: (usize, usize) = (440, 8);
const KEVNM: (usize, usize) = (448, 16);
const KCMPNM: (usize, usize) = (600, 8);

const NUMERIC_WORDS: usize = 110;
const TEXT_START: usize = NUMERIC_WORDS * 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn detect(bytes: &[u8]) -> Option<Self> {
        let word: [u8; 4] = bytes.get(NVHDR * 4..NVHDR * 4 + 4)?.try_into().ok()?;
        if i32::from_le_bytes(word) == HEADER_VERSION {
            Some(Self::Little)
        } else if i32::from_be_bytes(word) == HEADER_VERSION {
            Some(Self::Big)
        } else {
            None
        }
    }

    fn word(self, bytes: &[u8], index: usize) -> [u8; 4] {
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[index * 4..index * 4 + 4]);
        word
    }

    fn f32_at(self, bytes: &[u8], index: usize) -> f32 {
        let word = self.word(bytes, index);
        match self {
            Self::Little => f32::from_le_bytes(word),
            Self::Big => f32::from_be_bytes(word),
        }
    }

    fn i32_at(self, bytes: &[u8], index: usize) -> i32 {
        let word = self.word(bytes, index);
        match self {
            Self::Little => i32::from_le_bytes(word),
            Self::Big => i32::from_be_bytes(word),
        }
    }
}

/// Decode a SAC file held in memory.
pub fn decode_sac(bytes: &[u8]) -> Result<TimeSeries, ParseError> {
    if bytes.len() < HEADER_LEN {
        return Err(ParseError::invalid_format(
            "SAC",
            format!("file is {} bytes, shorter than the {}-byte header", bytes.len(), HEADER_LEN),
        ));
    }

    let order = ByteOrder::detect(bytes).ok_or_else(|| {
        ParseError::invalid_format("SAC", format!("header version is not {}", HEADER_VERSION))
    })?;

    let npts = order.i32_at(bytes, NPTS);
    if npts < 0 {
        return Err(ParseError::invalid_value("npts", npts.to_string()));
    }
    let npts = npts as usize;
    let expected = HEADER_LEN + 4 * npts;
    if bytes.len() < expected {
        return Err(ParseError::invalid_format(
            "SAC",
            format!("header declares {} samples but file holds {} bytes", npts, bytes.len()),
        ));
    }

    let delta = order.f32_at(bytes, DELTA);
    if !(delta > 0.0) {
        return Err(ParseError::invalid_value("delta", delta.to_string()));
    }
    let leven = order.i32_at(bytes, LEVEN);
    if leven == 0 {
        return Err(ParseError::invalid_format("SAC", "unevenly sampled traces are not supported"));
    }

    let b = order.f32_at(bytes, B);
    let b = if b == UNDEFINED_F { 0.0 } else { widen(b) };

    let data = &bytes[HEADER_LEN..expected];
    let samples = (0..npts)
        .map(|i| f64::from(order.f32_at(data, i)))
        .collect();

    let stats = TraceStats {
        station: read_text(bytes, KSTNM),
        component: read_text(bytes, KCMPNM),
        reference: read_reference(bytes, order)?,
    };

    Ok(TimeSeries::new(samples, Seconds(widen(delta)), Seconds(b)).with_stats(stats))
}

/// Encode `series` as a little-endian, evenly sampled SAC time series.
///
/// The reference time goes into the `nz*` fields to the millisecond; any
/// finer remainder is folded into `b`.
pub fn encode_sac(series: &TimeSeries) -> Vec<u8> {
    let mut floats = [UNDEFINED_F; 70];
    let mut ints = [UNDEFINED_I; 40];

    let reference = series.stats.reference;
    let millis = reference.nanosecond() / 1_000_000;
    let sub_milli = f64::from(reference.nanosecond() % 1_000_000) * 1e-9;
    let b = series.t_start.0 + sub_milli;

    let (min, max) = if series.is_empty() { (0.0, 0.0) } else { series.min_max() };
    let mean = if series.is_empty() { 0.0 } else { series.mean() };

    floats[DELTA] = series.dt.0 as f32;
    floats[DEPMIN] = min as f32;
    floats[DEPMAX] = max as f32;
    floats[B] = b as f32;
    floats[E] = (b + series.len().saturating_sub(1) as f64 * series.dt.0) as f32;
    floats[DEPMEN] = mean as f32;

    let mut set = |word: usize, value: i32| ints[word - 70] = value;
    set(NZYEAR, reference.year());
    set(NZJDAY, reference.ordinal() as i32);
    set(NZHOUR, reference.hour() as i32);
    set(NZMIN, reference.minute() as i32);
    set(NZSEC, reference.second() as i32);
    set(NZMSEC, millis.min(999) as i32);
    set(NVHDR, HEADER_VERSION);
    set(NPTS, series.len() as i32);
    set(IFTYPE, ITIME);
    set(LEVEN, 1);
    set(LPSPOL, 0);
    set(LOVROK, 1);
    set(LCALDA, 1);

    let mut out = Vec::with_capacity(HEADER_LEN + 4 * series.len());
    for f in floats {
        out.extend_from_slice(&f.to_le_bytes());
    }
    for i in ints {
        out.extend_from_slice(&i.to_le_bytes());
    }

    let mut text = vec![b' '; HEADER_LEN - TEXT_START];
    for offset in (0..text.len()).step_by(8) {
        text[offset..offset + UNDEFINED_K.len()].copy_from_slice(UNDEFINED_K.as_bytes());
    }
    // kevnm is a single 16-byte field.
    text[KEVNM.0 - TEXT_START + 8..KEVNM.0 - TEXT_START + KEVNM.1].fill(b' ');
    write_text(&mut text, KSTNM, &series.stats.station);
    write_text(&mut text, KCMPNM, &series.stats.component);
    out.extend_from_slice(&text);

    for s in &series.samples {
        out.extend_from_slice(&(*s as f32).to_le_bytes());
    }
    out
}

/// Read a SAC file.
pub fn read_sac(path: &Path) -> Result<TimeSeries, ParseError> {
    let bytes = std::fs::read(path)?;
    decode_sac(&bytes)
}

/// Write `series` to `path` as SAC.
pub fn write_sac(path: &Path, series: &TimeSeries) -> Result<(), ParseError> {
    std::fs::write(path, encode_sac(series))?;
    Ok(())
}

/// Shortest decimal that round-trips through `f32`, as `f64`.
///
/// Keeps a stored `0.05` as `0.05` rather than `0.0500000007`, so intervals
/// read back compare equal to the ones configured.
fn widen(x: f32) -> f64 {
    x.to_string().parse().unwrap_or(f64::from(x))
}

fn read_text(bytes: &[u8], (offset, width): (usize, usize)) -> String {
    let raw = String::from_utf8_lossy(&bytes[offset..offset + width]);
    let value = raw.trim_end_matches(|c: char| c == ' ' || c == '\0').trim_start();
    if value == UNDEFINED_K {
        String::new()
    } else {
        value.to_string()
    }
}

fn write_text(text: &mut [u8], (offset, width): (usize, usize), value: &str) {
    if value.is_empty() {
        return;
    }
    let field = &mut text[offset - TEXT_START..offset - TEXT_START + width];
    field.fill(b' ');
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    field[..n].copy_from_slice(&bytes[..n]);
}

fn read_reference(bytes: &[u8], order: ByteOrder) -> Result<NaiveDateTime, ParseError> {
    let year = order.i32_at(bytes, NZYEAR);
    let jday = order.i32_at(bytes, NZJDAY);
    if year == UNDEFINED_I || jday == UNDEFINED_I {
        return Ok(NaiveDateTime::default());
    }

    let field = |word: usize| {
        let v = order.i32_at(bytes, word);
        if v == UNDEFINED_I {
            0
        } else {
            v.max(0) as u32
        }
    };

    let date = NaiveDate::from_yo_opt(year, jday.max(0) as u32)
        .ok_or_else(|| ParseError::invalid_value("nzjday", format!("{}-{:03}", year, jday)))?;
    let time = NaiveTime::from_hms_milli_opt(field(NZHOUR), field(NZMIN), field(NZSEC), field(NZMSEC))
        .ok_or_else(|| ParseError::invalid_value("nztime", "hour/minute/second out of range"))?;

    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> TimeSeries {
        let reference = NaiveDate::from_ymd_opt(2015, 9, 16)
            .unwrap()
            .and_hms_milli_opt(22, 54, 32, 860)
            .unwrap();
        TimeSeries::new(vec![0.0, 1.5, -2.25, 4.0, 0.125], Seconds(0.05), Seconds(12.5)).with_stats(
            TraceStats {
                station: "PTRO".into(),
                component: "e".into(),
                reference,
            },
        )
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_sac(&sample_trace());

        assert_eq!(bytes.len(), HEADER_LEN + 5 * 4);
        assert_eq!(i32::from_le_bytes(bytes[304..308].try_into().unwrap()), 6);
        assert_eq!(i32::from_le_bytes(bytes[316..320].try_into().unwrap()), 5);
        assert_eq!(&bytes[440..448], b"PTRO    ");
        assert_eq!(&bytes[448..464], b"-12345          ");
        assert_eq!(&bytes[600..608], b"e       ");
        assert_eq!(&bytes[608..616], b"-12345  ");
    }

    #[test]
    fn test_round_trip_header_fields() {
        let trace = sample_trace();
        let back = decode_sac(&encode_sac(&trace)).unwrap();

        assert_eq!(back.len(), trace.len());
        assert_eq!(back.dt, Seconds(0.05));
        assert_eq!(back.t_start, Seconds(12.5));
        assert_eq!(back.stats, trace.stats);
        assert_eq!(back.samples, trace.samples);
    }

    #[test]
    fn test_reads_big_endian() {
        let mut bytes = encode_sac(&sample_trace());
        for word in bytes[..TEXT_START].chunks_exact_mut(4) {
            word.reverse();
        }
        for word in bytes[HEADER_LEN..].chunks_exact_mut(4) {
            word.reverse();
        }

        let back = decode_sac(&bytes).unwrap();
        assert_eq!(back.samples, sample_trace().samples);
        assert_eq!(back.stats.station, "PTRO");
    }

    #[test]
    fn test_undefined_reference_uses_epoch() {
        let trace = TimeSeries::new(vec![1.0], Seconds(1.0), Seconds::ZERO);
        let mut bytes = encode_sac(&trace);
        bytes[280..284].copy_from_slice(&UNDEFINED_I.to_le_bytes());

        let back = decode_sac(&bytes).unwrap();
        assert_eq!(back.stats.reference, NaiveDateTime::default());
        assert_eq!(back.stats.station, "");
    }

    #[test]
    fn test_rejects_truncated_data() {
        let bytes = encode_sac(&sample_trace());
        assert!(matches!(
            decode_sac(&bytes[..bytes.len() - 4]),
            Err(ParseError::InvalidFormat { .. })
        ));
        assert!(decode_sac(&bytes[..100]).is_err());
    }

    #[test]
    fn test_write_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.PTRO.vel.e");
        write_sac(&path, &sample_trace()).unwrap();

        let back = read_sac(&path).unwrap();
        assert_eq!(back.samples.len(), 5);
    }
}
