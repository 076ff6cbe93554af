//! Core domain types
//!
//! This module contains the core domain structures used across Bookline
//! services. These types represent the fundamental business entities and are
//! shared between the orchestrator (for persistence) and its API surface.

pub mod group;
pub mod job;
pub mod notification;
pub mod reservation;
