use thiserror::Error;

/// Every way a skill command can fail.
///
/// Operations never let one of these escape: they are turned into a failure
/// [`Response`](crate::host::Response) whose `data` is the display text.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Unable to predect that far in advance")]
    DayTooFar,

    #[error("Unable to predect the past")]
    DayInPast,

    #[error("Invalid hour")]
    InvalidHour,

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid argument '{name}': expected {expected}")]
    InvalidArgument { name: &'static str, expected: &'static str },

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("No '{0}' configured for the weather skill")]
    MissingCredential(&'static str),

    #[error("Request to weather provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Weather provider returned a non-JSON body: {0}")]
    UnexpectedBody(String),

    #[error("Weather provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("Weather provider response is missing '{0}'")]
    MissingField(String),

    #[error("Failed to encode weather report: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SkillError {
    /// True for errors detected before any network access.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SkillError::DayTooFar
                | SkillError::DayInPast
                | SkillError::InvalidHour
                | SkillError::MissingArgument(_)
                | SkillError::InvalidArgument { .. }
        )
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_stable() {
        assert_eq!(SkillError::DayTooFar.to_string(), "Unable to predect that far in advance");
        assert_eq!(SkillError::DayInPast.to_string(), "Unable to predect the past");
        assert_eq!(SkillError::InvalidHour.to_string(), "Invalid hour");
        assert!(SkillError::InvalidHour.is_validation());
        assert!(!SkillError::MissingField("current".into()).is_validation());
    }

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("oops"), "oops");

        let long = "é".repeat(300);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
