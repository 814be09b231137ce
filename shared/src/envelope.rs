use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HandlerError;

/// The three CORS headers attached to every response.
pub fn default_response_headers() -> BTreeMap<String, String> {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST,GET,OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Incoming event. `body` holds the handler input as a JSON-encoded string.
///
/// Any `body` value still deserialises so that the handler can answer with a
/// 500 instead of the runtime rejecting the event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub body: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(body: impl Into<String>) -> Self {
        RequestEnvelope {
            body: Some(Value::String(body.into())),
        }
    }

    /// The raw body text.
    pub fn body_str(&self) -> Result<&str, HandlerError> {
        match &self.body {
            None | Some(Value::Null) => Err(HandlerError::MissingField("body")),
            Some(Value::String(body)) => Ok(body),
            Some(_) => Err(HandlerError::invalid("body", "expected a string")),
        }
    }

    /// Wraps an already decoded input, the same way an HTTP front end would.
    pub fn from_json(input: &Value) -> Self {
        Self::new(input.to_string())
    }

    /// Decodes the body as a JSON object.
    pub fn object(&self) -> Result<Map<String, Value>, HandlerError> {
        match self.decode::<Value>()? {
            Value::Object(map) => Ok(map),
            _ => Err(HandlerError::BodyNotObject),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_str(self.body_str()?).map_err(HandlerError::MalformedBody)
    }
}

/// Looks up a field of a decoded body.
pub fn field<'a>(body: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, HandlerError> {
    body.get(name).ok_or(HandlerError::MissingField(name))
}

/// Looks up a field that has to be a JSON string.
pub fn str_field<'a>(body: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, HandlerError> {
    field(body, name)?
        .as_str()
        .ok_or_else(|| HandlerError::invalid(name, "expected a string"))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub is_base64_encoded: bool,
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl ResponseEnvelope {
    pub fn new(body: impl Into<String>, status_code: u16) -> Self {
        ResponseEnvelope {
            is_base64_encoded: false,
            status_code,
            body: body.into(),
            headers: default_response_headers(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(body, 200)
    }

    pub fn failure(err: HandlerError) -> Self {
        Self::new(err.into_trace(), 500)
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Maps a handler outcome onto the fixed 200/500 contract.
pub fn respond(result: Result<String, HandlerError>) -> ResponseEnvelope {
    match result {
        Ok(body) => ResponseEnvelope::ok(body),
        Err(err) => ResponseEnvelope::failure(err),
    }
}
