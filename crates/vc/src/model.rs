//! # Credential Data Model
//!
//! The data models for Verifiable Credentials (`vc`) and Verifiable
//! Presentations (`vp`), together with the JSON codec that moves between the
//! wire shapes and the canonical in-memory form.

pub mod vc;
pub mod vp;
