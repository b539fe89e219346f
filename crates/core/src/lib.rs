//! `splitledger-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, fixed-point money, and the shared domain error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ExpenseId, SplitId, UserId};
pub use money::{round2, Money, Percentage};
pub use value_object::ValueObject;
