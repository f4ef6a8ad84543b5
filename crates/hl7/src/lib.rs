//! HL7v2 wire/boundary support for the FHIR bridge.
//!
//! This crate provides **wire models** and **translation helpers** between
//! HL7v2 messages and FHIR-shaped patient records:
//! - scanning raw HL7v2 text into a structured [`ParsedRecord`]
//! - serialising a [`PatientResource`] into a minimal `ADT^A01` message
//!
//! This crate focuses on:
//! - best-effort segment scanning (no grammar, no escape sequences, one
//!   caret level only)
//! - serde wire structs shared with the REST layer
//!
//! Both translation directions are total functions over their inputs:
//! malformed data narrows the output, it never raises. Unlike the
//! `fhir-client` crate, nothing here performs I/O.

pub mod message;
pub mod patient;

// Re-export facades
pub use message::Message;
pub use patient::Patient;

// Re-export public wire types
pub use message::{Observation, ParsedRecord};
pub use patient::{HumanName, PatientResource};

/// Separator between HL7v2 segments.
pub const SEGMENT_SEPARATOR: char = '\r';

/// Separator between fields within a segment.
pub const FIELD_SEPARATOR: char = '|';

/// Separator between components within a field.
pub const COMPONENT_SEPARATOR: char = '^';
