//! Caption data group framing.
//!
//! A PES-extracted caption payload is one data group: either a
//! management record carrying the language table, or a statement record
//! carrying the data units with the actual text and DRCS bitmaps.

use tracing::{debug, trace};

use crate::error::{B24Error, Result};

/// Decoded caption data group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionDataGroup {
    /// Group A (0) or group B (1); the two alternate across service
    /// reconfiguration.
    pub group: u8,
    /// 0 = management, 1..=15 = statement for that language.
    pub language_id: u8,
    pub payload: GroupPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPayload {
    Management(ManagementData),
    Statement(StatementData),
}

/// Language table entry from a management record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Language tag 0..=7; statement groups with `language_id == tag + 1`
    /// belong to this entry.
    pub tag: u8,
    pub display_mode: u8,
    /// ISO 639-2 code, e.g. "jpn".
    pub iso_code: String,
    pub format: u8,
    pub tcs: u8,
    pub rollup: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementData {
    pub languages: Vec<LanguageEntry>,
    /// Management groups may carry data units (typically DRCS).
    pub units: Vec<DataUnit>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementData {
    pub units: Vec<DataUnit>,
}

/// One data unit inside a group payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUnit {
    /// Statement body bytes (the tokenizer's input).
    Statement(Vec<u8>),
    /// DRCS glyph records with 1- or 2-byte character codes.
    Drcs { byte_width: u8, data: Vec<u8> },
}

impl CaptionDataGroup {
    /// Parses one data group from `data`.
    pub fn parse(data: &[u8]) -> Result<CaptionDataGroup> {
        B24Error::check_len(data, 5)?;
        let data_group_id = data[0] >> 2;
        let group = (data_group_id & 0x20) >> 5;
        let language_id = data_group_id & 0x0F;
        let size = u16::from_be_bytes([data[3], data[4]]) as usize;
        B24Error::check_len(data, 5 + size)?;
        let payload = &data[5..5 + size];

        let payload = if language_id == 0 {
            GroupPayload::Management(parse_management(payload)?)
        } else {
            GroupPayload::Statement(parse_statement(payload)?)
        };

        Ok(CaptionDataGroup {
            group,
            language_id,
            payload,
        })
    }
}

fn parse_management(data: &[u8]) -> Result<ManagementData> {
    B24Error::check_len(data, 1)?;
    let tmd = data[0] >> 6;
    let mut pos = 1;
    if tmd == 0b10 {
        // OTM: 36-bit BCD offset time plus 4 reserved bits.
        pos += 5;
    }

    B24Error::check_len(data, pos + 1)?;
    let num_languages = data[pos] as usize;
    pos += 1;

    let mut languages = Vec::with_capacity(num_languages);
    for _ in 0..num_languages {
        B24Error::check_len(data, pos + 1)?;
        let tag = data[pos] >> 5;
        let display_mode = data[pos] & 0x0F;
        pos += 1;
        if matches!(display_mode, 0b1100 | 0b1101 | 0b1110) {
            // Display condition designation byte.
            pos += 1;
        }

        B24Error::check_len(data, pos + 4)?;
        let iso_code = String::from_utf8_lossy(&data[pos..pos + 3]).into_owned();
        let format = data[pos + 3] >> 4;
        let tcs = (data[pos + 3] >> 2) & 0x03;
        let rollup = data[pos + 3] & 0x03;
        pos += 4;

        languages.push(LanguageEntry {
            tag,
            display_mode,
            iso_code,
            format,
            tcs,
            rollup,
        });
    }

    let units = parse_unit_loop(data, pos)?;
    Ok(ManagementData { languages, units })
}

fn parse_statement(data: &[u8]) -> Result<StatementData> {
    B24Error::check_len(data, 1)?;
    let tmd = data[0] >> 6;
    let mut pos = 1;
    if matches!(tmd, 0b01 | 0b10) {
        // STM: 36-bit BCD presentation time plus 4 reserved bits.
        pos += 5;
    }

    let units = parse_unit_loop(data, pos)?;
    Ok(StatementData { units })
}

fn parse_unit_loop(data: &[u8], mut pos: usize) -> Result<Vec<DataUnit>> {
    B24Error::check_len(data, pos + 3)?;
    let loop_len =
        u32::from_be_bytes([0, data[pos], data[pos + 1], data[pos + 2]]) as usize;
    pos += 3;
    B24Error::check_len(data, pos + loop_len)?;
    let end = pos + loop_len;

    let mut units = Vec::new();
    while pos < end {
        B24Error::check_len(&data[..end], pos + 5)?;
        if data[pos] != 0x1F {
            return Err(B24Error::InvalidUnitSeparator(data[pos]));
        }
        let parameter = data[pos + 1];
        let size =
            u32::from_be_bytes([0, data[pos + 2], data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;
        B24Error::check_len(&data[..end], pos + size)?;
        let body = &data[pos..pos + size];
        pos += size;

        match parameter {
            0x20 => units.push(DataUnit::Statement(body.to_vec())),
            0x30 => units.push(DataUnit::Drcs {
                byte_width: 1,
                data: body.to_vec(),
            }),
            0x31 => units.push(DataUnit::Drcs {
                byte_width: 2,
                data: body.to_vec(),
            }),
            other => {
                // Bitmaps, geometric and colour map units are outside
                // caption text decoding.
                trace!(parameter = other, size, "skipping data unit");
            }
        }
    }

    debug!(units = units.len(), "parsed data unit loop");
    Ok(units)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Wraps `units` into a full statement data group for language
    /// `language_id` (free time control).
    pub fn statement_group(language_id: u8, units: &[(u8, &[u8])]) -> Vec<u8> {
        let mut loop_body = Vec::new();
        for (parameter, body) in units {
            loop_body.push(0x1F);
            loop_body.push(*parameter);
            loop_body.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
            loop_body.extend_from_slice(body);
        }

        let mut payload = vec![0x00]; // TMD = free
        payload.extend_from_slice(&(loop_body.len() as u32).to_be_bytes()[1..]);
        payload.extend_from_slice(&loop_body);

        let mut group = vec![language_id << 2, 0x00, 0x00];
        group.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        group.extend_from_slice(&payload);
        group
    }

    /// A management data group with one language entry.
    pub fn management_group(tag: u8, iso_code: &str) -> Vec<u8> {
        let mut payload = vec![0x00]; // TMD = free
        payload.push(0x01); // one language
        payload.push(tag << 5); // tag | DMF = auto display
        payload.extend_from_slice(iso_code.as_bytes());
        payload.push(0x00); // format/TCS/rollup
        payload.extend_from_slice(&[0x00, 0x00, 0x00]); // empty unit loop

        let mut group = vec![0x00, 0x00, 0x00];
        group.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        group.extend_from_slice(&payload);
        group
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{management_group, statement_group};
    use super::*;

    #[test]
    fn test_statement_group_roundtrip() {
        let body = [0x30, 0x26, 0x0C];
        let raw = statement_group(1, &[(0x20, &body)]);
        let group = CaptionDataGroup::parse(&raw).unwrap();

        assert_eq!(group.group, 0);
        assert_eq!(group.language_id, 1);
        let GroupPayload::Statement(statement) = group.payload else {
            panic!("expected statement payload");
        };
        assert_eq!(statement.units, vec![DataUnit::Statement(body.to_vec())]);
    }

    #[test]
    fn test_management_group_language_table() {
        let raw = management_group(0, "jpn");
        let group = CaptionDataGroup::parse(&raw).unwrap();

        assert_eq!(group.language_id, 0);
        let GroupPayload::Management(management) = group.payload else {
            panic!("expected management payload");
        };
        assert_eq!(management.languages.len(), 1);
        assert_eq!(management.languages[0].tag, 0);
        assert_eq!(management.languages[0].iso_code, "jpn");
        assert!(management.units.is_empty());
    }

    #[test]
    fn test_group_b_ids() {
        let mut raw = statement_group(1, &[(0x20, &[0x0C])]);
        raw[0] = (0x20 | 0x01) << 2; // language 1, group B
        let group = CaptionDataGroup::parse(&raw).unwrap();
        assert_eq!(group.group, 1);
        assert_eq!(group.language_id, 1);
    }

    #[test]
    fn test_truncated_group_is_error() {
        let raw = statement_group(1, &[(0x20, &[0x0C])]);
        let err = CaptionDataGroup::parse(&raw[..raw.len() - 1]).unwrap_err();
        assert!(matches!(err, B24Error::InsufficientData { .. }));
    }

    #[test]
    fn test_bad_unit_separator_is_error() {
        let mut raw = statement_group(1, &[(0x20, &[0x0C])]);
        // First byte of the unit loop body.
        let sep_at = raw.len() - 1 - 3 - 5 + 3;
        raw[sep_at] = 0x55;
        let err = CaptionDataGroup::parse(&raw).unwrap_err();
        assert!(matches!(err, B24Error::InvalidUnitSeparator(0x55)));
    }

    #[test]
    fn test_unknown_unit_parameter_skipped() {
        let raw = statement_group(1, &[(0x35, &[0xAA, 0xBB]), (0x20, &[0x0C])]);
        let group = CaptionDataGroup::parse(&raw).unwrap();
        let GroupPayload::Statement(statement) = group.payload else {
            panic!("expected statement payload");
        };
        assert_eq!(statement.units.len(), 1);
    }
}
