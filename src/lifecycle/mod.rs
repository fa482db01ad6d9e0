//! Lifecycle management for localization components

use crate::error::{LocalizationError, Result};

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
}

impl State {
    /// Transitions a node may take:
    /// configure (`Unconfigured -> Inactive`), activate (`Inactive -> Active`),
    /// deactivate (`Active -> Inactive`) and cleanup (`Inactive -> Unconfigured`).
    pub fn can_move_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
        )
    }
}

/// Tracks the lifecycle state of one component and rejects illegal transitions
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

impl LifecycleNodeBase {
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    /// Move to `next`, leaving the state untouched if the move is not allowed
    pub fn transition(&mut self, next: State) -> Result<()> {
        if !self.state.can_move_to(next) {
            return Err(LocalizationError::InvalidTransition {
                node: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }
}
