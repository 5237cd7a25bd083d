//! The control state machine.
//!
//! ```text
//! Unregistered ─register─▶ Registered ─initialize─▶ Initialized ─update─▶ Updating
//!                              │                         │                  │ ▲
//!                              └───────finalize──────────┴─────finalize─────┤ └update
//!                                                                           ▼
//!                                                                       Finalized
//! ```
//!
//! Each check returns the error the operation reports from the current
//! state, without changing it; the adapter commits a transition only
//! after the operation's side effects succeed.

use std::fmt;

use crate::error::AdapterError;

/// Lifecycle position of one adapter instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed; the singleton slot is not held.
    Unregistered,
    /// Holds the singleton slot; not yet initialized.
    Registered,
    /// Initialized; no step taken yet.
    Initialized,
    /// At least one step taken.
    Updating,
    /// Terminal.
    Finalized,
}

impl LifecycleState {
    /// Whether the engine is initialized and steppable.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Initialized | Self::Updating)
    }

    /// Whether the instance holds resources that finalize releases.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Registered | Self::Initialized | Self::Updating)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Initialized => "initialized",
            Self::Updating => "updating",
            Self::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Current state plus the legality rules for each transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// A fresh, unregistered lifecycle.
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Unregistered,
        }
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn protocol(&self, op: &'static str) -> AdapterError {
        AdapterError::Protocol {
            op,
            state: self.state,
        }
    }

    /// `register` is legal only once, from `Unregistered`.
    pub fn check_register(&self) -> Result<(), AdapterError> {
        use LifecycleState::*;
        match self.state {
            Unregistered => Ok(()),
            Registered | Initialized | Updating => Err(AdapterError::SingletonViolation),
            Finalized => Err(AdapterError::AlreadyFinalized),
        }
    }

    /// `initialize` is legal only from `Registered`.
    pub fn check_initialize(&self) -> Result<(), AdapterError> {
        use LifecycleState::*;
        match self.state {
            Registered => Ok(()),
            Initialized | Updating => Err(AdapterError::AlreadyInitialized),
            Finalized => Err(AdapterError::AlreadyFinalized),
            Unregistered => Err(self.protocol("initialize")),
        }
    }

    /// Stepping and data exchange need an initialized engine.
    pub fn check_running(&self, op: &'static str) -> Result<(), AdapterError> {
        if self.state.is_running() {
            Ok(())
        } else {
            Err(self.protocol(op))
        }
    }

    /// `finalize` is legal from any live state.
    pub fn check_finalize(&self) -> Result<(), AdapterError> {
        use LifecycleState::*;
        match self.state {
            Registered | Initialized | Updating => Ok(()),
            Finalized => Err(AdapterError::AlreadyFinalized),
            Unregistered => Err(self.protocol("finalize")),
        }
    }

    /// The communicator may change until the engine is initialized.
    pub fn check_communicator(&self) -> Result<(), AdapterError> {
        use LifecycleState::*;
        match self.state {
            Unregistered | Registered => Ok(()),
            Initialized | Updating => Err(AdapterError::AlreadyInitialized),
            Finalized => Err(AdapterError::AlreadyFinalized),
        }
    }

    pub(crate) fn registered(&mut self) {
        self.state = LifecycleState::Registered;
    }

    pub(crate) fn initialized(&mut self) {
        self.state = LifecycleState::Initialized;
    }

    pub(crate) fn stepped(&mut self) {
        self.state = LifecycleState::Updating;
    }

    pub(crate) fn finalized(&mut self) {
        self.state = LifecycleState::Finalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug)]
    enum Op {
        Register,
        Initialize,
        Update,
        Finalize,
    }

    /// Apply `op` the way the adapter does when every side effect succeeds.
    fn apply(lc: &mut Lifecycle, op: Op) -> Result<(), AdapterError> {
        match op {
            Op::Register => lc.check_register().map(|()| lc.registered()),
            Op::Initialize => lc.check_initialize().map(|()| lc.initialized()),
            Op::Update => lc.check_running("update").map(|()| lc.stepped()),
            Op::Finalize => lc.check_finalize().map(|()| lc.finalized()),
        }
    }

    #[test]
    fn happy_path() {
        let mut lc = Lifecycle::new();
        for op in [
            Op::Register,
            Op::Initialize,
            Op::Update,
            Op::Update,
            Op::Finalize,
        ] {
            apply(&mut lc, op).unwrap();
        }
        assert_eq!(lc.state(), LifecycleState::Finalized);
    }

    #[test]
    fn illegal_transitions_report_exact_errors() {
        let mut lc = Lifecycle::new();
        assert_eq!(
            lc.check_initialize(),
            Err(AdapterError::Protocol {
                op: "initialize",
                state: LifecycleState::Unregistered
            })
        );
        assert!(matches!(lc.check_finalize(), Err(AdapterError::Protocol { .. })));

        lc.registered();
        assert_eq!(lc.check_register(), Err(AdapterError::SingletonViolation));
        assert!(matches!(
            lc.check_running("update"),
            Err(AdapterError::Protocol { op: "update", .. })
        ));

        lc.initialized();
        assert_eq!(lc.check_initialize(), Err(AdapterError::AlreadyInitialized));
        assert_eq!(lc.check_communicator(), Err(AdapterError::AlreadyInitialized));

        lc.finalized();
        assert_eq!(lc.check_finalize(), Err(AdapterError::AlreadyFinalized));
        assert_eq!(lc.check_initialize(), Err(AdapterError::AlreadyFinalized));
        assert_eq!(lc.check_register(), Err(AdapterError::AlreadyFinalized));
        assert_eq!(lc.check_communicator(), Err(AdapterError::AlreadyFinalized));
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Register),
            Just(Op::Initialize),
            Just(Op::Update),
            Just(Op::Finalize),
        ]
    }

    proptest! {
        #[test]
        fn failed_ops_never_move_state(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut lc = Lifecycle::new();
            for op in ops {
                let before = lc.state();
                if apply(&mut lc, op).is_err() {
                    prop_assert_eq!(lc.state(), before);
                }
            }
        }

        #[test]
        fn finalized_is_terminal(ops in prop::collection::vec(op_strategy(), 0..20)) {
            let mut lc = Lifecycle::new();
            lc.registered();
            lc.finalized();
            for op in ops {
                prop_assert!(apply(&mut lc, op).is_err());
                prop_assert_eq!(lc.state(), LifecycleState::Finalized);
            }
        }
    }
}
