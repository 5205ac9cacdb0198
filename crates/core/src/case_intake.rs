//! Case intake classification values and submission completeness checks.

use crate::case_status::CaseStatus;
use crate::error::{CoreError, FieldError};

/* --------------------------------------------------------------------------
Classification enumerations
-------------------------------------------------------------------------- */

/// Surgical procedure the guide is made for.
pub const VALID_PROCEDURE_CATEGORIES: &[&str] = &[
    "single_implant",
    "multiple_implants",
    "full_arch",
    "bone_reduction",
    "crown_lengthening",
    "endodontic",
];

/// How the guide is seated.
pub const VALID_GUIDE_TYPES: &[&str] = &[
    "tooth_supported",
    "tissue_supported",
    "bone_supported",
    "stackable",
];

/// What the client is ordering.
pub const VALID_REQUIRED_SERVICES: &[&str] = &[
    "study_only",
    "design_only",
    "design_and_production",
];

/// Maximum length for the free-text case notes.
pub const MAX_NOTES_LENGTH: usize = 10_000;

/// Prefix for human-readable case numbers.
pub const CASE_NUMBER_PREFIX: &str = "SG";

/// Format a case number from the creation year and a sequence value,
/// e.g. `SG-2026-000042`.
pub fn format_case_number(year: i32, sequence: i64) -> String {
    format!("{CASE_NUMBER_PREFIX}-{year}-{sequence:06}")
}

fn check_enum(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    valid: &[&str],
) {
    match value.map(str::trim) {
        None | Some("") => errors.push(FieldError::new(field, "is required")),
        Some(v) if !valid.contains(&v) => errors.push(FieldError::new(
            field,
            format!("must be one of: {}", valid.join(", ")),
        )),
        Some(_) => {}
    }
}

/// Validate an optional classification value supplied while editing a draft.
pub fn validate_classification(
    procedure_category: Option<&str>,
    guide_type: Option<&str>,
    required_service: Option<&str>,
) -> Result<(), CoreError> {
    let mut errors = Vec::new();
    for (field, value, valid) in [
        ("procedure_category", procedure_category, VALID_PROCEDURE_CATEGORIES),
        ("guide_type", guide_type, VALID_GUIDE_TYPES),
        ("required_service", required_service, VALID_REQUIRED_SERVICES),
    ] {
        if value.is_some() {
            check_enum(&mut errors, field, value, valid);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/// Validate that a draft can be submitted.
///
/// The case must still be a draft and all three classification fields must
/// be present and enumerated.
pub fn validate_submission(
    status: CaseStatus,
    is_draft: bool,
    procedure_category: Option<&str>,
    guide_type: Option<&str>,
    required_service: Option<&str>,
) -> Result<(), CoreError> {
    if !is_draft || status != CaseStatus::Draft {
        return Err(CoreError::InvalidState(
            "Only draft cases can be submitted".to_string(),
        ));
    }

    let mut errors = Vec::new();
    check_enum(
        &mut errors,
        "procedure_category",
        procedure_category,
        VALID_PROCEDURE_CATEGORIES,
    );
    check_enum(&mut errors, "guide_type", guide_type, VALID_GUIDE_TYPES);
    check_enum(
        &mut errors,
        "required_service",
        required_service,
        VALID_REQUIRED_SERVICES,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/// Drafts are editable by their owner only while nothing has been submitted.
pub fn ensure_editable(status: CaseStatus, is_draft: bool) -> Result<(), CoreError> {
    if is_draft && status == CaseStatus::Draft {
        Ok(())
    } else {
        Err(CoreError::InvalidState(format!(
            "Case can no longer be edited (status '{status}')"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn case_number_is_zero_padded() {
        assert_eq!(format_case_number(2026, 42), "SG-2026-000042");
    }

    #[test]
    fn complete_draft_can_be_submitted() {
        assert!(validate_submission(
            CaseStatus::Draft,
            true,
            Some("single_implant"),
            Some("tooth_supported"),
            Some("design_and_production"),
        )
        .is_ok());
    }

    #[test]
    fn missing_fields_are_reported_individually() {
        let err = validate_submission(
            CaseStatus::Draft,
            true,
            None,
            Some("tooth_supported"),
            Some(""),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(fields) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["procedure_category", "required_service"]);
        });
    }

    #[test]
    fn unknown_guide_type_is_rejected() {
        let err = validate_submission(
            CaseStatus::Draft,
            true,
            Some("full_arch"),
            Some("magnetic"),
            Some("study_only"),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::InvalidFields(fields) => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].field, "guide_type");
        });
    }

    #[test]
    fn submitted_case_cannot_be_resubmitted() {
        assert_matches!(
            validate_submission(
                CaseStatus::Submitted,
                false,
                Some("full_arch"),
                Some("bone_supported"),
                Some("study_only"),
            ),
            Err(CoreError::InvalidState(_))
        );
    }

    #[test]
    fn partial_classification_update_only_checks_present_fields() {
        assert!(validate_classification(Some("endodontic"), None, None).is_ok());
        assert!(validate_classification(None, Some("nope"), None).is_err());
    }

    #[test]
    fn only_drafts_are_editable() {
        assert!(ensure_editable(CaseStatus::Draft, true).is_ok());
        assert!(ensure_editable(CaseStatus::PendingStudyPayment, true).is_err());
        assert!(ensure_editable(CaseStatus::Submitted, false).is_err());
    }
}
