use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// The three duel signs. The discriminant matches the dice rule:
/// `(die1 + die2) % 3` maps a roll onto a sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rps {
    Rock,
    Paper,
    Scissors,
}

impl Rps {
    #[inline]
    pub const fn from_index(index: u8) -> Self {
        match index % 3 {
            0 => Rps::Rock,
            1 => Rps::Paper,
            _ => Rps::Scissors,
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            Rps::Rock => 0,
            Rps::Paper => 1,
            Rps::Scissors => 2,
        }
    }

    /// The sign this one beats under the standard cycle.
    #[inline]
    pub const fn beats(self) -> Self {
        match self {
            Rps::Rock => Rps::Scissors,
            Rps::Paper => Rps::Rock,
            Rps::Scissors => Rps::Paper,
        }
    }
}

/// What the external actor asked for on the duel panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpsIntent {
    Pick(Rps),
    /// Roll two free dice and take whatever sign falls out.
    Random,
}

/// A resolved duel hand: a sign plus whether the roll behind it was a double.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelChoice {
    pub sign: Rps,
    pub is_special: bool,
}

/// Outcome of comparing two duel hands, before and after passive overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelOutcome {
    /// `Some(winner)`, or `None` for a tie.
    pub winner: Option<PlayerId>,
    pub is_special_win: bool,
}

impl DuelOutcome {
    pub const TIE: Self = Self {
        winner: None,
        is_special_win: false,
    };

    #[inline]
    pub const fn win(player: PlayerId, special: bool) -> Self {
        Self {
            winner: Some(player),
            is_special_win: special,
        }
    }

    #[inline]
    pub const fn is_tie(self) -> bool {
        self.winner.is_none()
    }
}

/// Per-round dice table selector. Resets to Normal after each decisive duel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceMode {
    #[default]
    Normal,
    /// Both dice capped at 3.
    Tiny,
    /// Both dice at least 4.
    Giant,
    /// The rigged player's first die is forced to 6.
    Rigged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// A start corner belonging to one of the players.
    Go,
    Chance,
    Buildable,
}

/// The closed set of character passives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterPassive {
    /// Passing own Go upgrades a random owned building; can build to level 5.
    Architect,
    /// Optional extra die of movement; earns money per space moved.
    Athlete,
    /// No passive.
    Civilian,
    /// Win streaks multiply all money received (x2 at 3 wins, x5 at 5).
    Duelist,
    /// Passive income doubled.
    Economist,
    /// Draws a chance card when landing on an own building; weights improve
    /// after 5 and 15 lifetime draws.
    Eventer,
    /// Banks treasure on losses, cashes out on special wins.
    Gambler,
    /// Money per duel win, tripled on special wins.
    LuckyOne,
    /// Double starting money; cannot build; pays doubled taxes.
    Major,
    /// Ties become wins and earn tokens; tokens blunt enemy special wins.
    Negotiator,
    /// Matching signs always tie; paid a growing bonus for forfeited wins.
    Pacifist,
    /// Every 4th roll is forced special (every 3rd from stage 3).
    Specialist,
    /// A lap without paying tax grants tax immunity and an income steal.
    Thief,
}

/// Blessings a player can accrue. At most one of each; collecting all six
/// non-ultimate variants grants Ascension automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlessingType {
    /// Additive surcharge on every tax this player collects.
    Toll,
    /// Raised special-roll chance.
    Fortune,
    /// Passive income +50%.
    Prosperity,
    /// Grants a pool of bonus movement steps.
    Stride,
    /// Every 5th duel pays out a stage-scaled bonus.
    Cadence,
    /// A free level-1 building on a random empty tile.
    Foundation,
    /// The ultimate: wipes the board and grants every buildable tile at max level.
    Ascension,
}

impl BlessingType {
    /// Every grantable (non-ultimate) blessing.
    pub const MUNDANE: [Self; 6] = [
        Self::Toll,
        Self::Fortune,
        Self::Prosperity,
        Self::Stride,
        Self::Cadence,
        Self::Foundation,
    ];
}

/// Curses. At most one of each; a 3rd distinct curse triggers the doom
/// cascade (properties reset, money halved, all curses lifted).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurseType {
    /// Cannot upgrade buildings until paying a tax.
    Sanction,
    /// No passive income until collecting a tax.
    Drought,
    /// Credited income halved until max-leveling a building.
    Recession,
    /// Ties count as losses until a special win. Negotiator is immune.
    Misfortune,
    /// Own buildings are taxed as if at most level 2.
    Depreciation,
    /// Every tax is paid twice over.
    Extortion,
}

impl CurseType {
    pub const ALL: [Self; 6] = [
        Self::Sanction,
        Self::Drought,
        Self::Recession,
        Self::Misfortune,
        Self::Depreciation,
        Self::Extortion,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Good,
    Bad,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    /// Collect taxes N times.
    CollectTaxes,
    /// Be the first to land on your own Go tile.
    LandOnGo,
    /// Roll a total of N sixes.
    RollSixes,
    /// Get N special rolls.
    GetSpecialRolls,
}

/// Reward granted to the first player reaching a quest target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestReward {
    Money { amount: i64 },
    FreeBuilding,
    GoodChanceCard,
    RandomBlessing,
    TaxImmunity,
    /// Added to the player's tax surcharge accumulator, in basis points.
    TaxMultiplierBp { value_bp: i32 },
}

/// Stage power-up choices surfaced at stages 1, 3 and 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    Money,
    RandomBlessing,
    SpecialChance,
}

/// Presentation-layer sound cues. Fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    DiceRoll,
    PieceMove,
    BuildProperty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// The loser could not pay an owed tax.
    Bankruptcy,
}

/// Which suspension point the engine is waiting on, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    Rps,
    Build,
    Upgrade,
    AthleteBonus,
    BonusSteps,
    CardAck,
    PowerUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rps_cycle_is_standard() {
        assert_eq!(Rps::Rock.beats(), Rps::Scissors);
        assert_eq!(Rps::Paper.beats(), Rps::Rock);
        assert_eq!(Rps::Scissors.beats(), Rps::Paper);
    }

    #[test]
    fn rps_from_index_follows_mod_three() {
        assert_eq!(Rps::from_index(0), Rps::Rock);
        assert_eq!(Rps::from_index(1), Rps::Paper);
        assert_eq!(Rps::from_index(2), Rps::Scissors);
        assert_eq!(Rps::from_index(12), Rps::Rock);
    }

    #[test]
    fn opponent_is_the_other_index() {
        assert_eq!(PlayerId(0).opponent(), PlayerId(1));
        assert_eq!(PlayerId(1).opponent(), PlayerId(0));
    }
}
