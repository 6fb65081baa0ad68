//! Backend request types

mod header;
mod method;
mod spec;

pub use header::{
    APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE, FORM_URLENCODED, Header, Headers,
};
pub use method::HttpMethod;
pub use spec::{ApiRequest, RequestBody};
