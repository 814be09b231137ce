use thiserror::Error;

/// Everything that can go wrong while a handler turns its request body into
/// a result. All variants end up as a 500 envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("request body is not valid JSON")]
    MalformedBody(#[source] serde_json::Error),

    #[error("request body must be a JSON object")]
    BodyNotObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("field `{field}` does not contain valid JSON")]
    MalformedInput {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write the formatted output")]
    Output(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        HandlerError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::MalformedBody(_) => "malformed_body",
            HandlerError::BodyNotObject => "body_not_object",
            HandlerError::MissingField(_) => "missing_field",
            HandlerError::InvalidField { .. } => "invalid_field",
            HandlerError::MalformedInput { .. } => "malformed_input",
            HandlerError::Output(_) => "output",
        }
    }

    /// Renders the error together with its whole `Caused by:` chain.
    pub fn into_trace(self) -> String {
        format!("{:?}", anyhow::Error::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_includes_cause_chain() {
        let source = serde_json::from_str::<serde_json::Value>("{bad json").unwrap_err();
        let err = HandlerError::MalformedInput {
            field: "input_string",
            source,
        };
        assert_eq!(err.kind(), "malformed_input");

        let trace = err.into_trace();
        assert!(trace.starts_with("field `input_string` does not contain valid JSON"));
        assert!(trace.contains("Caused by:"));
        assert!(trace.contains("line 1 column 2"));
    }

    #[test]
    fn trace_without_source_is_just_the_message() {
        let trace = HandlerError::MissingField("strings").into_trace();
        assert!(trace.starts_with("missing field `strings`"));
        assert!(!trace.contains("Caused by:"));
    }
}
