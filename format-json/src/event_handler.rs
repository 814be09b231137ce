use lambda_runtime::tracing::{debug, error};
use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use shared::{respond, str_field, HandlerError, RequestEnvelope, ResponseEnvelope};

/// Widest indent accepted, in spaces.
const MAX_INDENT: usize = 64;

/// Options decoded from the request body.
#[derive(Debug)]
struct FormatOptions {
    indent: usize,
    sort_keys: bool,
}

impl FormatOptions {
    fn from_body(body: &Map<String, Value>) -> Result<Self, HandlerError> {
        let indent = match shared::field(body, "indent")? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| HandlerError::invalid("indent", format!("{n} is not a non-negative integer")))?,
            Value::String(s) => s
                .parse::<u64>()
                .map_err(|e| HandlerError::invalid("indent", format!("{s:?}: {e}")))?,
            other => {
                return Err(HandlerError::invalid(
                    "indent",
                    format!("expected an integer or a string, got {other}"),
                ))
            }
        };
        let indent = usize::try_from(indent)
            .ok()
            .filter(|indent| *indent <= MAX_INDENT)
            .ok_or_else(|| HandlerError::invalid("indent", format!("{indent} is larger than {MAX_INDENT}")))?;

        // Only the literal string "True" turns sorting on.
        let sort_keys = matches!(body.get("sort_keys"), Some(Value::String(s)) if s == "True");

        Ok(FormatOptions { indent, sort_keys })
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn to_indented_string(value: &Value, indent: usize) -> Result<String, HandlerError> {
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    value
        .serialize(&mut serializer)
        .map_err(|e| HandlerError::Output(e.into()))?;
    String::from_utf8(out).map_err(|e| HandlerError::Output(e.into()))
}

pub(crate) fn format_json(request: &RequestEnvelope) -> Result<String, HandlerError> {
    let body = request.object()?;
    let options = FormatOptions::from_body(&body)?;

    let input = str_field(&body, "input_string")?;
    let mut value: Value = serde_json::from_str(input).map_err(|source| HandlerError::MalformedInput {
        field: "input_string",
        source,
    })?;
    if options.sort_keys {
        value = sort_keys(value);
    }

    debug!(?options, "formatted input_string");
    to_indented_string(&value, options.indent)
}

pub(crate) async fn function_handler(event: LambdaEvent<RequestEnvelope>) -> Result<ResponseEnvelope, Error> {
    let result = format_json(&event.payload).inspect_err(|err| {
        error!(kind = err.kind(), error = %err, "format_json failed");
    });

    Ok(respond(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Context;
    use serde_json::json;

    fn request(indent: Value, input_string: &str, sort_keys: &str) -> RequestEnvelope {
        RequestEnvelope::from_json(&json!({
            "indent": indent,
            "input_string": input_string,
            "sort_keys": sort_keys,
        }))
    }

    #[test]
    fn sorts_keys_at_every_level() {
        let input = r#"{"b": {"z": 1, "y": [{"d": 0, "c": 0}]}, "a": 2}"#;
        let out = format_json(&request(json!(2), input, "True")).unwrap();
        assert_eq!(
            out,
            r#"{
  "a": 2,
  "b": {
    "y": [
      {
        "c": 0,
        "d": 0
      }
    ],
    "z": 1
  }
}"#
        );
    }

    #[test]
    fn keeps_key_order_unless_literal_true() {
        let input = r#"{"b":"1","a":"2"}"#;
        for flag in ["False", "true", "", "TRUE"] {
            let out = format_json(&request(json!("4"), input, flag)).unwrap();
            assert_eq!(out, "{\n    \"b\": \"1\",\n    \"a\": \"2\"\n}", "sort_keys = {flag:?}");
        }
    }

    #[test]
    fn missing_sort_keys_means_no_sorting() {
        let request = RequestEnvelope::from_json(&json!({
            "indent": 1,
            "input_string": r#"{"b":1,"a":2}"#,
        }));
        assert_eq!(format_json(&request).unwrap(), "{\n \"b\": 1,\n \"a\": 2\n}");
    }

    #[test]
    fn zero_indent_still_breaks_lines() {
        let out = format_json(&request(json!(0), "[1,{}]", "False")).unwrap();
        assert_eq!(out, "[\n1,\n{}\n]");
    }

    #[test]
    fn output_reparses_to_the_input_value() {
        let inputs = [
            r#"{"name": "x", "nums": [1, 2.5, -3, 12345678901234567890123], "nested": {"ok": true, "nil": null}}"#,
            r#"[]"#,
            r#""just a string""#,
            r#"{"unicode": "café ☕", "esc": "a\"b\\c\n"}"#,
        ];
        for input in inputs {
            for indent in [0, 2, 7] {
                let out = format_json(&request(json!(indent), input, "True")).unwrap();
                let expected: Value = serde_json::from_str(input).unwrap();
                let actual: Value = serde_json::from_str(&out).unwrap();
                assert_eq!(actual, expected, "indent {indent} for {input}");
            }
        }
    }

    #[test]
    fn malformed_input_string_is_reported() {
        let err = format_json(&request(json!(2), "{bad json", "True")).unwrap_err();
        assert!(matches!(err, HandlerError::MalformedInput { field: "input_string", .. }));
    }

    #[test]
    fn indent_must_be_a_non_negative_integer() {
        for indent in [json!("two"), json!(-1), json!(1.5), json!(true), json!("-2"), json!(65)] {
            let err = format_json(&request(indent.clone(), "{}", "True")).unwrap_err();
            assert!(
                matches!(err, HandlerError::InvalidField { field: "indent", .. }),
                "indent {indent} gave {err:?}"
            );
        }
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let request = RequestEnvelope::from_json(&json!({ "indent": 2 }));
        assert!(matches!(
            format_json(&request),
            Err(HandlerError::MissingField("input_string"))
        ));
    }

    #[tokio::test]
    async fn handler_returns_500_for_bad_json() {
        let event = LambdaEvent::new(request(json!(2), "{bad json", "True"), Context::default());
        let response = function_handler(event).await.unwrap();

        assert_eq!(response.status_code, 500);
        assert!(!response.body.is_empty());
        assert!(response.body.contains("input_string"));
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    }

    #[test]
    fn widest_indent_is_accepted() {
        let out = format_json(&request(json!(64), "[1]", "False")).unwrap();
        assert_eq!(out, format!("[\n{}1\n]", " ".repeat(64)));
    }

    #[tokio::test]
    async fn handler_returns_500_for_huge_indent() {
        for indent in [json!("18446744073709551615"), json!(u64::MAX)] {
            let event = LambdaEvent::new(request(indent, "[1]", "False"), Context::default());
            let response = function_handler(event).await.unwrap();

            assert_eq!(response.status_code, 500);
            assert!(response.body.contains("invalid value for field `indent`"));
        }
    }

    #[tokio::test]
    async fn handler_returns_500_for_missing_body() {
        let event = LambdaEvent::new(RequestEnvelope::default(), Context::default());
        let response = function_handler(event).await.unwrap();

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("missing field `body`"));
    }

    #[tokio::test]
    async fn descriptor_fixture_matches_expected_result() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../configs/lambdas/format_json.json");
        let descriptor = shared::load_descriptor(path).unwrap();

        let event = LambdaEvent::new(descriptor.test_request(), Context::default());
        let response = function_handler(event).await.unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(Some(response.body), descriptor.expected_result);
    }
}
