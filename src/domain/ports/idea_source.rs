//! Idea source port.

use rand::seq::SliceRandom;

use crate::domain::errors::{DomainError, DomainResult};

/// Provider of starter song ideas.
pub trait IdeaSource: Send + Sync {
    /// The full list of ideas.
    fn ideas(&self) -> &[String];

    /// Pick one idea uniformly at random.
    fn pick_random(&self) -> DomainResult<String> {
        self.ideas()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(DomainError::NoIdeas)
    }
}
