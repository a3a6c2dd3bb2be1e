//! Identifiers used by the catalog service
//!
//! Two kinds of identifiers live here:
//!
//! - [`ObjectId`]: the 24 character hex identifier every stored document
//!   carries in its `_id` field. The first four bytes encode the creation
//!   time in seconds, the remaining eight are random.
//! - [`RequestId`]: a TypeID (`req_<base32 uuidv7>`) attached to every HTTP
//!   request for log correlation.
//!
//! ```rust
//! use catalog_service::ids::ObjectId;
//!
//! let id = ObjectId::new();
//! assert_eq!(id.as_str().len(), 24);
//! assert!(ObjectId::is_valid(id.as_str()));
//! assert!(!ObjectId::is_valid("not-an-id"));
//! ```

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use http::Request;
use mti::prelude::*;
use serde::{Deserialize, Serialize};
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Length of the hex representation of an [`ObjectId`]
pub const OBJECT_ID_LEN: usize = 24;

/// Document identifier in the object-id format
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        let seconds = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random = uuid::Uuid::new_v4();

        let mut hex = String::with_capacity(OBJECT_ID_LEN);
        for byte in seconds
            .to_be_bytes()
            .iter()
            .chain(random.as_bytes().iter().take(8))
        {
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Check whether `candidate` has the shape of an object id
    #[must_use]
    pub fn is_valid(candidate: &str) -> bool {
        candidate.len() == OBJECT_ID_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(ObjectIdError(s.to_string()))
        }
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Error returned when a string is not a valid object id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {0}")]
pub struct ObjectIdError(pub String);

/// A type-safe request identifier for distributed tracing.
///
/// Format: `req_<base32-encoded-uuidv7>`, e.g. `req_01h455vb4pex5vsknk084sn02q`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The prefix used for request IDs
    pub const PREFIX: &'static str = "req";

    /// Creates a new time-sortable request ID
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Returns the request ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `MakeRequestId` implementation used by the request-id layer
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_shape() {
        let id = ObjectId::new();
        assert_eq!(id.as_str().len(), OBJECT_ID_LEN);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_object_id_validation() {
        assert!(ObjectId::is_valid("65f1c2a9e4b0a1b2c3d4e5f6"));
        assert!(!ObjectId::is_valid("65f1c2a9e4b0a1b2c3d4e5f"));
        assert!(!ObjectId::is_valid("65f1c2a9e4b0a1b2c3d4e5fz"));
        assert!(!ObjectId::is_valid(""));
    }

    #[test]
    fn test_object_id_parse() {
        let id: ObjectId = "65F1C2A9E4B0A1B2C3D4E5F6".parse().unwrap();
        assert_eq!(id.as_str(), "65f1c2a9e4b0a1b2c3d4e5f6");

        let err = "nope".parse::<ObjectId>().unwrap_err();
        assert_eq!(err, ObjectIdError("nope".to_string()));
    }

    #[test]
    fn test_request_id_new() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        assert_eq!(id.as_str().len(), 30);
    }

    #[test]
    fn test_make_typed_request_id() {
        let mut maker = MakeTypedRequestId;
        let request = http::Request::builder().body(()).unwrap();

        let header_value = maker.make_request_id(&request).unwrap().into_header_value();
        assert!(header_value.to_str().unwrap().starts_with("req_"));
    }
}
