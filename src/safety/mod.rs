//! Safety layer: page policy checks.
//!
//! Every tab is checked against the restricted-page list before the
//! orchestrator injects anything into it.

pub mod url_policy;
