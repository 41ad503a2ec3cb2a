// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TRX-class RSL messages (spec.md §4.3, "the engine dispatches on
//! discriminator to: ... TRX").

use crate::oml::mo::AdminOpState;

/// TRX-class messages this BTS consumes (Osmocom/ip.access extensions
/// for RF resource reporting and TRX-wide administrative control).
#[derive(Debug, Clone)]
pub enum TrxMessage {
    /// Request the TRX's current admin/oper/avail state.
    RfResourceIndicationReq,
    /// BSC forces the TRX administratively locked or unlocked.
    SetAdminState { locked: bool },
}

/// Apply a `TrxMessage` to a TRX's combined state, returning the state
/// to report back (for `RfResourceIndicationReq`) or the new state
/// itself (for `SetAdminState`).
pub fn apply(state: &mut AdminOpState, msg: &TrxMessage) -> AdminOpState {
    match msg {
        TrxMessage::RfResourceIndicationReq => *state,
        TrxMessage::SetAdminState { locked } => {
            if *locked {
                state.lock();
            } else {
                state.unlock();
            }
            *state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_admin_state_locks_and_unlocks() {
        let mut state = AdminOpState::initial();
        apply(&mut state, &TrxMessage::SetAdminState { locked: true });
        assert!(!state.is_enabled());
        apply(&mut state, &TrxMessage::SetAdminState { locked: false });
        assert_eq!(state.admin, crate::oml::mo::AdminState::Unlocked);
    }
}
