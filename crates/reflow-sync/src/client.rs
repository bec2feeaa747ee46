#![forbid(unsafe_code)]

//! The remote sync capability.
//!
//! [`SyncClient`] is the seam between the reorder logic and whatever
//! transport persists it. The contract is uniform: a submission either
//! fully succeeds (`Ok(Ack)`, with the backend's optional message) or fails
//! as one [`SyncError`] — transport trouble, a non-success HTTP status, an
//! explicit backend rejection, and an undecodable body are all just
//! failures to the caller, which reverts optimistic state the same way for
//! each.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::Deserialize;

use crate::payload::Update;

/// Decoded success response body: `{ "success": true, "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// A bare success acknowledgement.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

/// Why a submission failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The request never produced a response (connection, DNS, timeout).
    Transport(String),
    /// The backend answered with a non-success HTTP status.
    Status(u16),
    /// The backend answered `success: false`, optionally saying why.
    Rejected { message: Option<String> },
    /// The response body did not decode as an acknowledgement.
    MalformedResponse,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "transport failure: {detail}"),
            Self::Status(code) => write!(f, "server responded with status {code}"),
            Self::Rejected { message: Some(message) } => {
                write!(f, "server rejected the update: {message}")
            }
            Self::Rejected { message: None } => write!(f, "server rejected the update"),
            Self::MalformedResponse => write!(f, "server response was not understood"),
        }
    }
}

impl std::error::Error for SyncError {}

/// A capability that persists one [`Update`] remotely.
///
/// Implementations must map a decoded `success: false` body to
/// [`SyncError::Rejected`]: an `Ok` return always means the backend
/// accepted the write.
#[allow(async_fn_in_trait)] // Single-threaded UI setting; no Send bound wanted.
pub trait SyncClient {
    async fn submit(&self, update: &Update) -> Result<Ack, SyncError>;
}

/// In-memory [`SyncClient`] with scripted verdicts and recorded
/// submissions.
///
/// Test support for reorder flows: verdicts are consumed in order, and once
/// the script runs out every further submission succeeds.
#[derive(Debug, Default)]
pub struct MockSyncClient {
    verdicts: RefCell<VecDeque<Result<Ack, SyncError>>>,
    submissions: RefCell<Vec<Update>>,
}

impl MockSyncClient {
    /// A client that acknowledges everything.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A client that answers with the given verdicts, in order.
    #[must_use]
    pub fn scripted(verdicts: impl IntoIterator<Item = Result<Ack, SyncError>>) -> Self {
        Self {
            verdicts: RefCell::new(verdicts.into_iter().collect()),
            submissions: RefCell::new(Vec::new()),
        }
    }

    /// Everything submitted so far, in submission order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Update> {
        self.submissions.borrow().clone()
    }

    /// Number of submissions so far.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.submissions.borrow().len()
    }
}

impl SyncClient for MockSyncClient {
    async fn submit(&self, update: &Update) -> Result<Ack, SyncError> {
        self.submissions.borrow_mut().push(update.clone());
        self.verdicts
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Ack::ok()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::MembershipPayload;

    fn membership() -> Update {
        Update::Membership(MembershipPayload {
            id: "1".into(),
            column: "parent_id".into(),
            value: Some("2".into()),
        })
    }

    #[test]
    fn ack_decodes_with_and_without_message() {
        let ack: Ack = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(ack, Ack::ok());

        let ack: Ack =
            serde_json::from_str(r#"{"success": false, "message": "depth limit"}"#).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message.as_deref(), Some("depth limit"));
    }

    #[test]
    fn ack_requires_success_field() {
        assert!(serde_json::from_str::<Ack>(r#"{"message": "hi"}"#).is_err());
    }

    #[test]
    fn error_display_is_human_readable() {
        assert_eq!(
            SyncError::Rejected { message: Some("no".into()) }.to_string(),
            "server rejected the update: no"
        );
        assert_eq!(SyncError::Status(500).to_string(), "server responded with status 500");
    }

    #[tokio::test]
    async fn mock_consumes_script_then_accepts() {
        let client = MockSyncClient::scripted([
            Err(SyncError::Status(422)),
            Ok(Ack {
                success: true,
                message: Some("saved".into()),
            }),
        ]);

        assert_eq!(client.submit(&membership()).await, Err(SyncError::Status(422)));
        let ack = client.submit(&membership()).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("saved"));
        // Script exhausted — default acknowledgement.
        assert_eq!(client.submit(&membership()).await, Ok(Ack::ok()));
        assert_eq!(client.submission_count(), 3);
    }
}
