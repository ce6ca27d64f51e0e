//! Kaji is a vulnerability research database with an AI assistant.
//!
//! # Features
//!
//! - OS version catalogue with per-severity exploit counts
//! - Exploit records with CVE ids, CVSS scores, PoC material and tags
//! - User reports with AI-assisted triage
//! - AI chat with conversation context
//! - Admin tooling (stats, audit log, AI scans, training data review)
//!
//! Storage and the AI gateway are pluggable adapters; the server itself only
//! talks to the [`meta_adapter::MetaAdapter`], [`auth_adapter::AuthAdapter`]
//! and [`ai_adapter::AiAdapter`] traits.

#![forbid(unsafe_code)]

pub mod error;
pub mod core;
pub mod admin;
pub mod auth;
pub mod chat;
pub mod exploit;
pub mod report;
pub mod version;
pub mod ai_adapter;
pub mod auth_adapter;
pub mod meta_adapter;
pub mod prelude;
pub mod types;
pub mod routes;

pub use crate::core::app::{App, AppBuilder};

// vim: ts=4
