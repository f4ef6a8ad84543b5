//! FHIR-shaped patient wire model and the HL7v2 serialiser.
//!
//! Responsibilities:
//! - Define a loose wire model for patient resources arriving as JSON
//! - Serialise a patient resource into a minimal `ADT^A01` message
//!
//! Notes:
//! - The wire model deliberately ignores unknown keys; the gateway accepts
//!   whatever subset of a FHIR Patient the caller supplies.
//! - Serialisation only ever emits the header and at most one `PID`
//!   segment. Observations are never written back, so parsing the output
//!   of [`Patient::render`] recovers strictly less than went in.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::SEGMENT_SEPARATOR;

/// Fixed message header emitted in front of every serialised message.
///
/// Constant by contract, timestamp included: downstream consumers pin
/// their expectations to this exact segment.
const MSH_HEADER: &str = "MSH|^~\\&|SENDING_APP|SENDING_FACILITY|RECEIVING_APP|RECEIVING_FACILITY|20230615120000||ADT^A01|MSG00001|P|2.5";

// ============================================================================
// Public wire types
// ============================================================================

/// One entry of a patient's `name` list.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct HumanName {
    /// Family name (surname).
    pub family: Option<String>,

    /// Given names; only the first is serialised.
    pub given: Vec<String>,
}

/// FHIR-shaped patient resource accepted by the serialiser.
///
/// Every field is optional and unknown keys are ignored. This mirrors the
/// loose JSON the gateway receives rather than a conformant FHIR Patient.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct PatientResource {
    /// Resource identifier.
    pub id: Option<String>,

    /// Administrative gender, carried through as-is.
    pub gender: Option<String>,

    /// Date of birth, carried through as-is.
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,

    /// Human names; only the first entry is serialised.
    pub name: Vec<HumanName>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// Zero-sized namespace for the HL7v2 serialisation direction, mirroring
/// [`crate::Message`] on the parsing side.
pub struct Patient;

impl Patient {
    /// Serialise a patient resource into a minimal HL7v2 `ADT^A01` message.
    ///
    /// The header segment is a fixed constant. A `PID` segment follows
    /// only when the resource carries at least one name entry; every
    /// absent field inside it becomes the empty string. Segments are
    /// joined with carriage returns and there is no trailing separator.
    ///
    /// # Arguments
    ///
    /// * `resource` - Patient data in the loose wire shape.
    ///
    /// # Returns
    ///
    /// The serialised message. This function is total: any resource value
    /// produces a well-formed message, at minimum the bare header.
    pub fn render(resource: &PatientResource) -> String {
        let mut segments = vec![MSH_HEADER.to_string()];

        if let Some(name) = resource.name.first() {
            let family = name.family.as_deref().unwrap_or_default();
            let given = name.given.first().map(String::as_str).unwrap_or_default();
            let id = resource.id.as_deref().unwrap_or_default();
            let gender = resource.gender.as_deref().unwrap_or_default();
            let birth_date = resource.birth_date.as_deref().unwrap_or_default();

            segments.push(format!(
                "PID|||{id}||{family}^{given}||{birth_date}|{gender}"
            ));
        }

        segments.join(&SEGMENT_SEPARATOR.to_string())
    }
}
