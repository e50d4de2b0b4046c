//! Host lifecycle state machine.
//!
//! Tracks the host's foreground/background/destroyed phase and propagates
//! transitions into the current context's engine. Transitions are idempotent
//! and the whole read-modify-hook sequence runs under the coordinator lock,
//! because transitions race against context publication.

use serde::{Deserialize, Serialize};

use crate::context::ScriptContext;

/// The host's lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No foreground activity has been seen (or the host tore down).
    #[default]
    BeforeCreate,
    /// The host exists but is backgrounded.
    BeforeResume,
    /// The host is in the foreground.
    Resumed,
}

/// Move to `Resumed`, firing the resume hook on the current context when the
/// transition actually crosses into the foreground (or when `force` is set,
/// used to replay host state onto a freshly published context).
pub(crate) fn move_to_resumed(
    state: &mut LifecycleState,
    current: Option<&ScriptContext>,
    force: bool,
) {
    if let Some(context) = current {
        // There is no dedicated on-create hook; resume covers both entries.
        if force || matches!(*state, LifecycleState::BeforeResume | LifecycleState::BeforeCreate) {
            context.on_host_resume();
        }
    }
    *state = LifecycleState::Resumed;
}

/// Move to `BeforeResume` (backgrounding), firing the pause hook once.
///
/// If the host skipped the intermediate phase and is still in
/// `BeforeCreate`, the context gets a resume immediately followed by a pause
/// so it never observes an impossible transition.
pub(crate) fn move_to_before_resume(state: &mut LifecycleState, current: Option<&ScriptContext>) {
    if let Some(context) = current {
        match *state {
            LifecycleState::BeforeCreate => {
                context.on_host_resume();
                context.on_host_pause();
            }
            LifecycleState::Resumed => context.on_host_pause(),
            LifecycleState::BeforeResume => {}
        }
    }
    *state = LifecycleState::BeforeResume;
}

/// Move to `BeforeCreate` (host teardown), stepping through `BeforeResume`
/// so the context sees pause before destroy.
pub(crate) fn move_to_before_create(state: &mut LifecycleState, current: Option<&ScriptContext>) {
    if let Some(context) = current {
        if *state == LifecycleState::Resumed {
            context.on_host_pause();
            *state = LifecycleState::BeforeResume;
        }
        if *state == LifecycleState::BeforeResume {
            context.on_host_destroy();
        }
    }
    *state = LifecycleState::BeforeCreate;
}

/// Replay the host's current phase onto a freshly published context so its
/// phase matches the host's without an extra transition being dropped or
/// duplicated.
pub(crate) fn replay_to_current(state: &mut LifecycleState, current: Option<&ScriptContext>) {
    if *state == LifecycleState::Resumed {
        move_to_resumed(state, current, true);
    }
}
