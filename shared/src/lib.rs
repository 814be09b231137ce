//! Types shared by the handlers and the build tools: the request and response
//! envelopes, handler errors, function descriptors and the domain name lookup.

pub mod descriptor;
pub mod domain;
pub mod envelope;
pub mod error;

pub use descriptor::{
    function_name, load_descriptor, load_descriptors, DescriptorError, FieldKind, FormField,
    FunctionDescriptor,
};
pub use domain::{parse_domain_name, read_domain_name, DomainNameError};
pub use envelope::{default_response_headers, field, respond, str_field, RequestEnvelope, ResponseEnvelope};
pub use error::HandlerError;
