//! Behavioural test suites for the messaging core.

mod support;
