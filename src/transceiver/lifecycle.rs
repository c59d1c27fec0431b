//! Administrative up/down state of a component.

/// Lifecycle operation applied to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    /// Bring the component up.
    Start,
    /// Shut the component down in an orderly way.
    Stop,
    /// The component fails abruptly.
    Crash,
}

/// Current operational state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationalState {
    /// Never started, or stopped.
    #[default]
    NotOperating,
    /// Up and accepting traffic.
    Operating,
    /// Crashed.
    Crashed,
}

/// Where a message handled by a component came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// A timer the component scheduled itself.
    SelfTimer,
    /// Traffic arriving from another component.
    External,
}

/// Tracks the operational state and decides which messages are admitted.
#[derive(Debug, Clone, Default)]
pub struct Operational {
    state: OperationalState,
}

impl Operational {
    /// Start out not operating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> OperationalState {
        self.state
    }

    /// Check if operating.
    pub fn is_up(&self) -> bool {
        self.state == OperationalState::Operating
    }

    /// Apply a lifecycle operation; returns the previous state.
    pub fn apply(&mut self, operation: LifecycleOperation) -> OperationalState {
        let previous = self.state;
        self.state = match operation {
            LifecycleOperation::Start => OperationalState::Operating,
            LifecycleOperation::Stop => OperationalState::NotOperating,
            LifecycleOperation::Crash => OperationalState::Crashed,
        };
        previous
    }

    /// Check if a message from `origin` should be processed.
    ///
    /// Self-originated timers are always processed so a component can wind
    /// down in an orderly way; external traffic only while operating.
    pub fn admits(&self, origin: MessageOrigin) -> bool {
        match origin {
            MessageOrigin::SelfTimer => true,
            MessageOrigin::External => self.is_up(),
        }
    }
}
