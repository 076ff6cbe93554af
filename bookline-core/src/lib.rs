//! Bookline Core
//!
//! Core types and abstractions for the Bookline reservation-call system.
//!
//! This crate contains:
//! - Domain types: Core business entities (CallJob, NotifyGroup, Reservation, etc.)
//! - DTOs: Data transfer objects for the HTTP API and gateway webhooks

pub mod domain;
pub mod dto;
