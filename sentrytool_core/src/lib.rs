//!
//! Access to Sentry
//!
//! Provides the privilege codec, the Sentry client interface, and the
//! configuration and logging shared by the `sentrytool` CLI.
#![deny(missing_docs)]

pub use client::{ApiError, SentryClient};
pub use codec::{ParseError, PrivilegeCodec};
pub use privilege::{Privilege, PrivilegeFilter};
pub use role::Role;

pub mod client;
pub mod codec;
pub mod config;
pub mod logging;
pub mod memory;
pub mod policy_file;
pub mod privilege;
pub mod project;
pub mod role;
