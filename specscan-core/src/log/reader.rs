//! Scan log reader
//!
//! Zero-copy parsing of record lines for post-processing and tests.

use core::str::FromStr;

use super::RecordKind;

/// Errors from parsing a record line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// No `kind,sequence|` prefix
    MissingSeparator,
    /// Kind tag not recognised
    UnknownKind,
    /// Sequence number is not an integer
    BadSequence,
    /// Payload entry is not `key=value`
    BadField,
    /// Requested key is not present
    MissingField,
    /// Value could not be parsed
    BadValue,
}

/// One parsed record line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Record kind
    pub kind: RecordKind,
    /// Sequence number within the kind
    pub sequence: u32,
    payload: &'a str,
}

impl<'a> Record<'a> {
    /// Parse a line, with or without its line ending
    ///
    /// Every payload entry must be `key=value`, so a line cut short by a
    /// failed write is rejected rather than read as a shorter record.
    pub fn parse(line: &'a str) -> Result<Self, RecordError> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let (head, payload) = line.split_once('|').ok_or(RecordError::MissingSeparator)?;
        let (tag, sequence) = head.split_once(',').ok_or(RecordError::MissingSeparator)?;
        let kind = RecordKind::from_tag(tag).ok_or(RecordError::UnknownKind)?;
        let sequence = sequence.parse().map_err(|_| RecordError::BadSequence)?;

        let record = Self {
            kind,
            sequence,
            payload,
        };
        for entry in record.fields() {
            let (_, value) = entry?;
            if value.starts_with('[') != value.ends_with(']') {
                return Err(RecordError::BadValue);
            }
        }
        Ok(record)
    }

    /// Raw payload after the `|`
    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// `key=value` entries in order
    pub fn fields(&self) -> impl Iterator<Item = Result<(&'a str, &'a str), RecordError>> + 'a {
        self.payload
            .split(';')
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.split_once('=').ok_or(RecordError::BadField))
    }

    /// Raw value of `key`
    pub fn field(&self, key: &str) -> Option<&'a str> {
        self.fields()
            .filter_map(Result::ok)
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Parsed scalar value of `key`
    pub fn value<T: FromStr>(&self, key: &str) -> Result<T, RecordError> {
        self.field(key)
            .ok_or(RecordError::MissingField)?
            .parse()
            .map_err(|_| RecordError::BadValue)
    }
}

/// Elements of a `[a,b,c]` value
pub fn parse_list<T: FromStr>(
    value: &str,
) -> Result<impl Iterator<Item = Result<T, RecordError>> + '_, RecordError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(RecordError::BadValue)?;
    Ok(inner
        .split(',')
        .filter(|item| !item.is_empty())
        .map(|item| item.trim().parse().map_err(|_| RecordError::BadValue)))
}

/// Records of a whole log, skipping blank lines
pub fn records(text: &str) -> impl Iterator<Item = Result<Record<'_>, RecordError>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(Record::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const PIXEL: &str = "p,7|xy=[-5,2.5];head_deg=0;pitch_deg=0;roll_deg=0;spect_au=[10,20,30]\r\n";

    #[test]
    fn test_parse_pixel_record() {
        let record = Record::parse(PIXEL).unwrap();
        assert_eq!(record.kind, RecordKind::Pixel);
        assert_eq!(record.sequence, 7);
        assert_eq!(record.field("head_deg"), Some("0"));
        assert_eq!(record.value::<f32>("roll_deg"), Ok(0.0));

        let xy: Vec<f32> = parse_list(record.field("xy").unwrap())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(xy, [-5.0, 2.5]);

        let spectrum: Vec<u16> = parse_list(record.field("spect_au").unwrap())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(spectrum, [10, 20, 30]);
    }

    #[test]
    fn test_fields_in_order() {
        let record = Record::parse(PIXEL).unwrap();
        let keys: Vec<&str> = record.fields().map(|f| f.unwrap().0).collect();
        assert_eq!(keys, ["xy", "head_deg", "pitch_deg", "roll_deg", "spect_au"]);
    }

    #[test]
    fn test_missing_and_bad_values() {
        let record = Record::parse("h,0|file_version=one").unwrap();
        assert_eq!(record.value::<u32>("file_version"), Err(RecordError::BadValue));
        assert_eq!(record.value::<u32>("n_pixels"), Err(RecordError::MissingField));
        assert!(parse_list::<u16>("10,20").is_err());
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(Record::parse("p,0"), Err(RecordError::MissingSeparator));
        assert_eq!(Record::parse("p|xy=[0,0]"), Err(RecordError::MissingSeparator));
        assert_eq!(Record::parse("q,0|x=1"), Err(RecordError::UnknownKind));
        assert_eq!(Record::parse("p,x|x=1"), Err(RecordError::BadSequence));

        assert_eq!(Record::parse("h,2|n_pixels"), Err(RecordError::BadField));
        assert_eq!(
            Record::parse("p,3|xy=[1,2];spect_au=[10,2"),
            Err(RecordError::BadValue)
        );
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(parse_list::<u16>("[]").unwrap().count(), 0);
    }

    #[test]
    fn test_records_skip_blank_lines() {
        let text = "h,0|file_version=1\r\n\r\nw,0|wavelength_nm=[]\r\n";
        let kinds: Vec<RecordKind> = records(text).map(|r| r.unwrap().kind).collect();
        assert_eq!(kinds, [RecordKind::Header, RecordKind::Wavelengths]);
    }
}
