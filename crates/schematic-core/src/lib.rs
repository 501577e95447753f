//! Schematic Core Types and Definitions
//!
//! This crate provides the foundational types shared by every stage of the
//! Schematic pipeline. It includes:
//!
//! - **Identifiers**: Efficient string-interned identifiers ([`identifier::Id`])
//! - **Model**: The typed diagram description ([`model`] module)
//! - **References**: Connection references between ports ([`reference`] module)
//! - **Flat graph**: The primitive-only graph produced by module flattening
//!   ([`flat`] module)

pub mod flat;
pub mod identifier;
pub mod model;
pub mod reference;
