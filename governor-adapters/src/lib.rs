//! Outbound admin client for the cloud agent.
//!
//! Topic handlers drive the agent's admin API through the [`traits::AdminApi`]
//! seam; [`acapy`] provides the hyper-backed implementation used in
//! production. Retry behavior deliberately lives outside this crate.

#![warn(missing_docs, clippy::pedantic)]

pub mod acapy;
pub mod traits;

mod http_client;
