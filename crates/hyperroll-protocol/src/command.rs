use serde::{Deserialize, Serialize};

use crate::{BuildingTypeId, PlayerId, PowerUp, RpsIntent};

/// All possible client→sim commands. Fully serializable.
///
/// Each command is only valid while the engine is suspended in the matching
/// wait phase; anything else is rejected and treated as a no-op.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Pick a sign (or ask for a free roll) for the round's duel.
    ChooseRps { player: PlayerId, intent: RpsIntent },

    /// Build the given type on the tile currently offered.
    Build { building: BuildingTypeId },
    /// Decline the build offer.
    PassBuild,

    /// Accept or decline the offered upgrade.
    RespondUpgrade { accept: bool },

    /// Accept or decline the athlete's extra movement die.
    RespondAthleteBonus { accept: bool },

    /// Spend part of the bonus-steps pool on the pending move (0 = none).
    SpendBonusSteps { steps: u32 },

    /// Dismiss the chance card currently shown.
    AcknowledgeCard,

    /// Pick a stage power-up.
    PickPowerUp { choice: PowerUp },
}
