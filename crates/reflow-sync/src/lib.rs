#![forbid(unsafe_code)]

//! Remote synchronization for Reflow reorder flows.
//!
//! Defines the wire payloads a reorder backend accepts (`order` maps,
//! membership assignments, nested trees), the [`SyncClient`] capability the
//! controller submits them through, and — behind the `http` feature — a
//! reqwest-backed client that attaches the session's anti-forgery token.
//!
//! Failure is deliberately flat: transport errors, non-success statuses,
//! explicit rejections, and undecodable bodies are all a [`SyncError`],
//! because the caller's recovery (revert the optimistic UI state, tell the
//! user) is identical for each.

pub mod client;
#[cfg(feature = "http")]
pub mod http;
pub mod payload;

pub use client::{Ack, MockSyncClient, SyncClient, SyncError};
#[cfg(feature = "http")]
pub use http::{HttpSyncClient, StaticToken, TokenProvider};
pub use payload::{MembershipPayload, OrderPayload, TreeNode, TreePayload, Update};
