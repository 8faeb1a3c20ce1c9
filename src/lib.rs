//! Client library for the GenEx exercise sheet generator.
//!
//! The [`genex`] module holds the domain: project configuration, the creation
//! wizard, the HTTP client and the screen logic built on top of it. Session,
//! theme and storage are shared services used by the `genex` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod genex;
pub mod handler;
pub mod session;
pub mod storage;
pub mod telemetry;
pub mod theme;
pub mod types;

pub mod metadata {
    include!(concat!(env!("OUT_DIR"), "/pkg_info.rs"));
}
