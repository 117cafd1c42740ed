// src/schema/sources.rs
//! Field maps for the four patient sources.

use super::{AddressLayout, NameLayout, SourceSchema};

pub const CLINIC: &str = "clinic";
pub const HOSPITAL: &str = "hospital";
pub const URGENT_CARE: &str = "urgent_care";
pub const PHYSICAL_THERAPY: &str = "physical_therapy";

pub fn clinic() -> SourceSchema {
    SourceSchema {
        source_name: CLINIC.to_string(),
        id_field: "patient_id".to_string(),
        name: NameLayout::Split {
            first: "first_name".to_string(),
            middle: None,
            last: "last_name".to_string(),
        },
        date_of_birth: "date_of_birth".to_string(),
        phone: Some("phone_number".to_string()),
        email: Some("email".to_string()),
        address: Some(AddressLayout::Combined {
            field: "address".to_string(),
        }),
        insurance_id: Some("insurance_id".to_string()),
    }
}

/// Urgent care calls the birth date `dob` and keeps the whole address in `address_line`.
pub fn urgent_care() -> SourceSchema {
    SourceSchema {
        source_name: URGENT_CARE.to_string(),
        id_field: "patient_id".to_string(),
        name: NameLayout::Split {
            first: "first_name".to_string(),
            middle: None,
            last: "last_name".to_string(),
        },
        date_of_birth: "dob".to_string(),
        phone: Some("phone".to_string()),
        email: Some("email".to_string()),
        address: Some(AddressLayout::Combined {
            field: "address_line".to_string(),
        }),
        insurance_id: Some("insurance_id".to_string()),
    }
}

/// Hospital stores the address as a JSON object and identifies coverage by policy number.
pub fn hospital() -> SourceSchema {
    SourceSchema {
        source_name: HOSPITAL.to_string(),
        id_field: "hospital_patient_id".to_string(),
        name: NameLayout::Split {
            first: "first_name".to_string(),
            middle: Some("middle_name".to_string()),
            last: "last_name".to_string(),
        },
        date_of_birth: "date_of_birth".to_string(),
        phone: Some("phone_number".to_string()),
        email: Some("email_address".to_string()),
        address: Some(AddressLayout::JsonObject {
            field: "address".to_string(),
        }),
        insurance_id: Some("policy_number".to_string()),
    }
}

/// Physical therapy has a single `full_name` column and split address columns.
/// Its `insurance` column names the carrier, not a member id, so it is not mapped.
pub fn physical_therapy() -> SourceSchema {
    SourceSchema {
        source_name: PHYSICAL_THERAPY.to_string(),
        id_field: "pt_patient_id".to_string(),
        name: NameLayout::Full {
            field: "full_name".to_string(),
        },
        date_of_birth: "dob".to_string(),
        phone: Some("contact_phone".to_string()),
        email: Some("email".to_string()),
        address: Some(AddressLayout::Columns {
            line: "street_address".to_string(),
            city: Some("city".to_string()),
            state: Some("state".to_string()),
            zip: Some("zip_code".to_string()),
        }),
        insurance_id: None,
    }
}

pub fn builtin_schemas() -> Vec<SourceSchema> {
    vec![clinic(), urgent_care(), hospital(), physical_therapy()]
}
