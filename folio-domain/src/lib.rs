//! # Folio Domain Library
//!
//! This crate contains the domain core of Folio, the property-management
//! client: entities, repositories, services, the task-creation strategy
//! chain, and the wiring that holds them together. All persistence and
//! auth is delegated to the hosted backend through `folio-backend`.
//!
//! ## Module Organization
//!
//! - `entity`: Identity primitives (`EntityId`, the `Entity` trait)
//! - `models`: Domain entities (portfolio, task, image, profile, address)
//! - `repository`: Generic CRUD contract, backend and in-memory impls
//! - `services`: Business rules and orchestration
//! - `strategy`: Ordered task-creation fallback chain
//! - `container`: Token-indexed service locator
//! - `bootstrap`: Composition root
//! - `monitor`: Session idle-timeout watcher
//! - `error`: Common error type

pub mod bootstrap;
pub mod container;
pub mod entity;
pub mod error;
pub mod models;
pub mod monitor;
pub mod repository;
pub mod services;
pub mod strategy;

/// Current version of the Folio domain library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
