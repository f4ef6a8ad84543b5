//! HL7v2 message scanning into structured patient records.
//!
//! Responsibilities:
//! - Split raw HL7v2 text into segments and pipe-delimited fields
//! - Extract patient identification from `PID` segments
//! - Extract observations from `OBX` segments in encounter order
//!
//! Notes:
//! - This is a flat field-splitter, not a conformant HL7v2 parser:
//!   repetition fields, escape sequences and sub-components are carried
//!   through as opaque text.
//! - Scanning is total. Malformed input yields a sparser record, never an
//!   error: fields beyond a segment's length are treated as absent.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{COMPONENT_SEPARATOR, FIELD_SEPARATOR, SEGMENT_SEPARATOR};

// ============================================================================
// Public wire types
// ============================================================================

/// A single observation extracted from an `OBX` segment.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub struct Observation {
    /// Observation identifier (`OBX-3`), often a `code^text^system` triple
    /// carried through untouched.
    pub id: String,

    /// Observed value (`OBX-5`).
    pub value: String,

    /// Units (`OBX-6`); `null` when the segment ends before that field.
    pub units: Option<String>,
}

/// Structured record produced by scanning an HL7v2 message.
///
/// Keys that were never seen are omitted from the JSON form entirely, and
/// `observations` is omitted while empty. `units` inside an observation is
/// the one deliberate exception: it is always present, as `null` when the
/// source segment stopped short.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
pub struct ParsedRecord {
    /// Patient identifier (`PID-3`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    /// Family name, first component of `PID-5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Given name, second component of `PID-5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Observations in segment encounter order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observations: Vec<Observation>,
}

// ============================================================================
// Public Message operations
// ============================================================================

/// HL7v2 message operations.
///
/// This is a zero-sized type used for namespacing message-level scanning.
/// All methods are associated functions.
pub struct Message;

impl Message {
    /// Scan an HL7v2 message into a [`ParsedRecord`].
    ///
    /// Segments are separated by carriage returns; empty segments are
    /// skipped. A `PID` segment with more than five fields contributes the
    /// patient identifier and, when `PID-5` carries at least two caret
    /// components, the family and given names. An `OBX` segment with more
    /// than five fields appends one observation. Every other segment type
    /// is ignored.
    ///
    /// # Arguments
    ///
    /// * `text` - Raw HL7v2 message text.
    ///
    /// # Returns
    ///
    /// A best-effort record. This function accepts any string: unknown
    /// segments contribute nothing, and a later `PID` segment overwrites
    /// patient fields from an earlier one (last write wins).
    pub fn parse(text: &str) -> ParsedRecord {
        let mut record = ParsedRecord::default();

        for segment in text.split(SEGMENT_SEPARATOR) {
            if segment.is_empty() {
                continue;
            }

            let fields: Vec<&str> = segment.split(FIELD_SEPARATOR).collect();

            match fields[0] {
                "PID" if fields.len() > 5 => {
                    record.patient_id = Some(fields[3].to_string());

                    let name_parts: Vec<&str> = fields[5].split(COMPONENT_SEPARATOR).collect();
                    // A name without both components is dropped entirely
                    // rather than half-populated.
                    if name_parts.len() >= 2 {
                        record.last_name = Some(name_parts[0].to_string());
                        record.first_name = Some(name_parts[1].to_string());
                    }
                }
                "OBX" if fields.len() > 5 => {
                    record.observations.push(Observation {
                        id: fields[3].to_string(),
                        value: fields[5].to_string(),
                        units: fields.get(6).map(|u| (*u).to_string()),
                    });
                }
                _ => {}
            }
        }

        record
    }
}
