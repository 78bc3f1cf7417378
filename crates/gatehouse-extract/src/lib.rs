//! Request input decoding for the Gatehouse routing layer.
//!
//! Validates the path, query, header and body channels of a matched
//! request against the route definition's declared schemas, with
//! strict percent-decoding of path parameters and a clean distinction
//! between "not valid JSON" and "valid JSON, wrong shape".

pub mod decode;
pub mod error;
pub mod percent;

pub use decode::{decode_request, BodyInput, DecodedInput};
pub use error::{DecodeError, DecodeErrorKind};
pub use percent::{percent_decode, PercentError};
