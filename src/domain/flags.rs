// ============================================================================
// Market Control Flags
// Per-player confirmation-skip toggles and the global freeze
// ============================================================================

use std::collections::HashMap;

use super::listing::PlayerId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The four confirmation-gated actions. Each has an independent per-player
/// skip flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConfirmAction {
    Buy,
    Sell,
    EBuy,
    ESell,
}

impl ConfirmAction {
    pub const ALL: [ConfirmAction; 4] = [
        ConfirmAction::Buy,
        ConfirmAction::Sell,
        ConfirmAction::EBuy,
        ConfirmAction::ESell,
    ];
}

/// Per-player confirmation-skip flags. `true` means "skip the confirmation
/// step, execute immediately"; absent means `false`.
#[derive(Debug, Default)]
pub struct PlayerFlags {
    rows: HashMap<(PlayerId, ConfirmAction), bool>,
}

impl PlayerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skips_confirmation(&self, player: PlayerId, action: ConfirmAction) -> bool {
        self.rows.get(&(player, action)).copied().unwrap_or(false)
    }

    /// Flip one flag, returning the new value.
    pub fn toggle(&mut self, player: PlayerId, action: ConfirmAction) -> bool {
        let flag = self.rows.entry((player, action)).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn set(&mut self, player: PlayerId, action: ConfirmAction, value: bool) {
        self.rows.insert((player, action), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_confirmation_required() {
        let flags = PlayerFlags::new();
        let player = PlayerId::new();
        for action in ConfirmAction::ALL {
            assert!(!flags.skips_confirmation(player, action));
        }
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut flags = PlayerFlags::new();
        let player = PlayerId::new();

        assert!(flags.toggle(player, ConfirmAction::Buy));
        assert!(flags.skips_confirmation(player, ConfirmAction::Buy));
        // Other actions stay independent
        assert!(!flags.skips_confirmation(player, ConfirmAction::Sell));

        assert!(!flags.toggle(player, ConfirmAction::Buy));
        assert!(!flags.skips_confirmation(player, ConfirmAction::Buy));
    }
}
