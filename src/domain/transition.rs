//! Explicit status machines
//!
//! Every persisted status enum implements [`StatusMachine`]. Storage never
//! writes a status it did not receive as the `to` side of a [`Transition`],
//! and always guards the write with the `from` side (compare-and-swap).

use super::DomainResult;
use crate::shared::errors::DomainError;

/// A validated move between two states of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
}

pub trait StatusMachine: Copy + Eq + Sized {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    fn as_str(&self) -> &'static str;

    fn can_transition_to(self, next: Self) -> bool;

    fn transition_to(self, next: Self) -> DomainResult<Transition<Self>> {
        if self.can_transition_to(next) {
            Ok(Transition {
                from: self,
                to: next,
            })
        } else {
            Err(DomainError::IllegalTransition {
                entity: Self::ENTITY,
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}
