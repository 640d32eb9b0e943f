//! Shared utilities used across the relay.

pub mod cert_parser;

pub use cert_parser::{parse_x509_basic, BasicCertInfo};
