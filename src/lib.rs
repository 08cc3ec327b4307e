//! circuit-iam: the identity, authentication, role-based authorisation and
//! session-lifecycle core behind every page of the circuit web application.
//!
//! The surrounding HTTP routing, templates and static assets live in the
//! application above this crate; they hand us an opaque session token and
//! ask three questions: who is this, are they authenticated, and may they
//! perform this action.

pub mod config;
pub mod error;
pub mod identity;
