use lambda_runtime::tracing::{debug, error};
use lambda_runtime::{Error, LambdaEvent};
use shared::{respond, str_field, HandlerError, RequestEnvelope, ResponseEnvelope};

/// Joins newline separated values into `in ('a','b',...)`.
///
/// Blank lines are dropped. Quotes inside a value are copied as they are.
pub(crate) fn in_clause(strings: &str) -> String {
    let quoted: Vec<String> = strings
        .split('\n')
        .filter(|s| !s.is_empty())
        .map(|s| format!("'{s}'"))
        .collect();
    format!("in ({})", quoted.join(","))
}

pub(crate) fn query_in_clause_generator(request: &RequestEnvelope) -> Result<String, HandlerError> {
    let body = request.object()?;
    let strings = str_field(&body, "strings")?;

    let clause = in_clause(strings);
    debug!(len = clause.len(), "generated in clause");
    Ok(clause)
}

pub(crate) async fn function_handler(event: LambdaEvent<RequestEnvelope>) -> Result<ResponseEnvelope, Error> {
    let result = query_in_clause_generator(&event.payload).inspect_err(|err| {
        error!(kind = err.kind(), error = %err, "query_in_clause_generator failed");
    });

    Ok(respond(result))
}
