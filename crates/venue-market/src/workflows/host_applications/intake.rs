use super::domain::{
    ApplicationId, ApplicationStatus, HostApplicationSubmission, ListQuery, NewHostApplication,
    OfferingType, ReviewCommand, ReviewDecision, ReviewRequest,
};

/// Upper bound on free-text fields (`notes`, `reviewNotes`), counted in characters.
pub const MAX_NOTES_CHARS: usize = 2000;

/// Validation errors raised before a payload reaches the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("offeringType must be one of space, event, both (found '{0}')")]
    UnknownOfferingType(String),
    #[error("categories must contain at least one entry")]
    MissingCategories,
    #[error("{field} entries must be non-empty strings")]
    BlankEntry { field: &'static str },
    #[error("capacity must be a positive integer (found {0})")]
    NonPositiveCapacity(i64),
    #[error("capacity exceeds the supported maximum of {max}")]
    CapacityTooLarge { max: u32 },
    #[error("{field} must be at most {max} characters (found {found})")]
    TooLong {
        field: &'static str,
        max: usize,
        found: usize,
    },
    #[error("status must be one of approved, rejected (found '{0}')")]
    UnknownDecision(String),
    #[error("status must be one of pending, approved, rejected (found '{0}')")]
    UnknownStatus(String),
    #[error("id must be a positive integer (found '{0}')")]
    InvalidApplicationId(String),
}

/// The store keeps capacity in a signed 32-bit column.
const MAX_CAPACITY: u32 = i32::MAX as u32;

/// Guard responsible for turning wire payloads into validated commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionGuard;

impl SubmissionGuard {
    pub fn validate_submission(
        &self,
        submission: HostApplicationSubmission,
    ) -> Result<NewHostApplication, ValidationError> {
        let HostApplicationSubmission {
            offering_type,
            space_types,
            categories,
            capacity,
            notes,
        } = submission;

        let offering_type = offering_type
            .parse::<OfferingType>()
            .map_err(|err| ValidationError::UnknownOfferingType(err.0))?;

        let space_types = space_types.unwrap_or_default();
        ensure_entries_present("spaceTypes", &space_types)?;

        if categories.is_empty() {
            return Err(ValidationError::MissingCategories);
        }
        ensure_entries_present("categories", &categories)?;

        if capacity <= 0 {
            return Err(ValidationError::NonPositiveCapacity(capacity));
        }
        let capacity = u32::try_from(capacity)
            .ok()
            .filter(|value| *value <= MAX_CAPACITY)
            .ok_or(ValidationError::CapacityTooLarge { max: MAX_CAPACITY })?;

        let notes = notes.unwrap_or_default();
        ensure_length("notes", &notes)?;

        Ok(NewHostApplication {
            offering_type,
            space_types,
            categories,
            capacity,
            notes,
        })
    }

    pub fn validate_review(&self, request: ReviewRequest) -> Result<ReviewCommand, ValidationError> {
        let decision = request
            .status
            .parse::<ReviewDecision>()
            .map_err(|err| ValidationError::UnknownDecision(err.0))?;

        let review_notes = request.review_notes.unwrap_or_default();
        ensure_length("reviewNotes", &review_notes)?;

        Ok(ReviewCommand {
            decision,
            review_notes,
        })
    }

    pub fn validate_list_query(&self, query: ListQuery) -> Result<ApplicationStatus, ValidationError> {
        match query.status {
            None => Ok(ApplicationStatus::Pending),
            Some(raw) => raw
                .parse::<ApplicationStatus>()
                .map_err(|err| ValidationError::UnknownStatus(err.0)),
        }
    }

    pub fn validate_application_id(&self, raw: &str) -> Result<ApplicationId, ValidationError> {
        raw.trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(ApplicationId)
            .ok_or_else(|| ValidationError::InvalidApplicationId(raw.to_string()))
    }
}

fn ensure_entries_present(field: &'static str, entries: &[String]) -> Result<(), ValidationError> {
    if entries.iter().any(|entry| entry.is_empty()) {
        return Err(ValidationError::BlankEntry { field });
    }
    Ok(())
}

fn ensure_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let found = value.chars().count();
    if found > MAX_NOTES_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NOTES_CHARS,
            found,
        });
    }
    Ok(())
}
