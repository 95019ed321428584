use std::collections::HashMap;

use hyperroll_protocol::{
    BlessingType, BuildingTypeId, CardCategory, CardId, CharacterId, CharacterPassive, CurseType,
    DataId, DiceMode, QuestKind, QuestReward,
};
use serde::Deserialize;

/// Reference data compiled from YAML: building economics, the character
/// roster, and the three chance-card decks. Immutable for the life of a game.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub buildings: Vec<BuildingType>,
    pub characters: Vec<Character>,
    pub cards: Vec<ChanceCard>,

    pub building_ids: HashMap<DataId, BuildingTypeId>,
    pub character_ids: HashMap<DataId, CharacterId>,
    pub card_ids: HashMap<DataId, CardId>,

    /// Card ids bucketed per category, in deck order.
    pub decks: CardDecks,
}

#[derive(Debug, Clone, Default)]
pub struct CardDecks {
    pub good: Vec<CardId>,
    pub bad: Vec<CardId>,
    pub unknown: Vec<CardId>,
}

impl CardDecks {
    pub fn deck(&self, category: CardCategory) -> &[CardId] {
        match category {
            CardCategory::Good => &self.good,
            CardCategory::Bad => &self.bad,
            CardCategory::Unknown => &self.unknown,
        }
    }
}

impl CompiledRules {
    pub fn building(&self, id: BuildingTypeId) -> &BuildingType {
        &self.buildings[id.raw as usize]
    }

    pub fn character(&self, id: CharacterId) -> &Character {
        &self.characters[id.raw as usize]
    }

    pub fn card(&self, id: CardId) -> &ChanceCard {
        &self.cards[id.raw as usize]
    }

    pub fn building_id(&self, data_id: &str) -> Option<BuildingTypeId> {
        self.building_ids.get(data_id).copied()
    }

    pub fn character_id(&self, data_id: &str) -> Option<CharacterId> {
        self.character_ids.get(data_id).copied()
    }

    pub fn character_with_passive(&self, passive: CharacterPassive) -> Option<CharacterId> {
        self.characters
            .iter()
            .position(|c| c.passive == passive)
            .map(|i| CharacterId::new(i as u16))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBuildingType {
    pub name: String,
    pub cost: i64,
    /// Base income rate at level 1, in basis points (500 = 5%).
    pub income_rate_bp: i32,
    /// Cost to upgrade TO each level: element 0 reaches level 2, etc.
    pub upgrade_costs: Vec<i64>,
    /// Tax rate per level, in basis points. Element 0 is level 1. Levels
    /// beyond the list use the last defined rate.
    pub tax_rates_bp: Vec<i32>,
}

impl RawBuildingType {
    pub fn compile(self) -> Result<BuildingType, crate::rules::RulesError> {
        if self.tax_rates_bp.is_empty() {
            return Err(crate::rules::RulesError::InvalidData(format!(
                "building '{}' has no tax rates",
                self.name
            )));
        }
        Ok(BuildingType {
            name: self.name,
            cost: self.cost.max(0),
            income_rate_bp: self.income_rate_bp.max(0),
            upgrade_costs: self.upgrade_costs,
            tax_rates_bp: self.tax_rates_bp,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BuildingType {
    pub name: String,
    pub cost: i64,
    pub income_rate_bp: i32,
    pub upgrade_costs: Vec<i64>,
    pub tax_rates_bp: Vec<i32>,
}

impl BuildingType {
    /// Tax rate for a 1-based level, clamping to the last defined rate.
    pub fn tax_rate_bp(&self, level: u8) -> i32 {
        if level == 0 {
            return 0;
        }
        let index = (level as usize - 1).min(self.tax_rates_bp.len() - 1);
        self.tax_rates_bp[index]
    }

    /// Cost to upgrade from `level` to `level + 1`, if the data defines one.
    pub fn upgrade_cost_from(&self, level: u8) -> Option<i64> {
        if level == 0 {
            return None;
        }
        self.upgrade_costs
            .get(level as usize - 1)
            .copied()
            .or_else(|| self.upgrade_costs.last().copied())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCharacter {
    pub name: String,
    pub description: String,
    pub passive: CharacterPassive,
}

impl RawCharacter {
    pub fn compile(self) -> Character {
        Character {
            name: self.name,
            description: self.description,
            passive: self.passive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub name: String,
    pub description: String,
    pub passive: CharacterPassive,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChanceCard {
    pub title: String,
    pub description: String,
    pub category: CardCategory,
    pub effect: CardEffect,
}

impl RawChanceCard {
    pub fn compile(self) -> ChanceCard {
        ChanceCard {
            title: self.title,
            description: self.description,
            category: self.category,
            effect: self.effect,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChanceCard {
    pub title: String,
    pub description: String,
    pub category: CardCategory,
    pub effect: CardEffect,
}

/// The closed set of chance-card effects. One `apply` dispatcher in
/// `cards.rs` interprets these against the game state.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum CardEffect {
    /// Flat grant, scaled by `(stage + 1)`.
    GainMoney { amount: i64 },
    /// Lose a fifth of current money.
    LoseMoneyFifth,
    /// `(flat + per_building * owned) * (stage + 1)`.
    GainMoneyPerBuilding { flat: i64, per_building: i64 },
    /// `base + per_lap * laps_completed`.
    GainMoneyPerLap { base: i64, per_lap: i64 },
    GrantTaxImmunity,
    GrantGuaranteedWin,
    GrantBlessing { blessing: BlessingType },
    GrantRandomBlessing,
    /// A random blessing and a random curse at once.
    MixedBlessing,
    InflictCurse { curse: CurseType },
    InflictRandomCurse,
    /// Lift a random curse if cursed, otherwise inflict a random one.
    GambleCurse,
    RemoveAllCurses,
    RemoveAllBlessings,
    StartQuest {
        kind: QuestKind,
        target: i64,
        reward: QuestReward,
    },
    SeizeRandomProperty,
    /// Liquidate every owned property for `cost * multiplier_bp`.
    SellAllBuildings { multiplier_bp: i32 },
    /// Upgrade a random owned building, or build a free fallback if none.
    UpgradeOrBuild { fallback: String },
    /// One good card and one bad card, immediately.
    DrawGoodAndBad,
    SetDiceMode { mode: DiceMode },
    /// Skip the player's next round.
    Afk,
    /// Roll a single die for the next `duels` duels.
    SingleDice { duels: u32 },
    /// Random signs for `duels` duels, but wins are forced special.
    ChaosDuel { duels: u32 },
    /// Both players' money set to the average.
    BalanceMoney,
    GrantOverwhelmingPower,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_rate_clamps_to_last_level() {
        let b = BuildingType {
            name: "house".into(),
            cost: 200,
            income_rate_bp: 500,
            upgrade_costs: vec![150, 250, 400],
            tax_rates_bp: vec![1000, 2000, 3500, 5000],
        };
        assert_eq!(b.tax_rate_bp(1), 1000);
        assert_eq!(b.tax_rate_bp(4), 5000);
        assert_eq!(b.tax_rate_bp(9), 5000);
        assert_eq!(b.tax_rate_bp(0), 0);
    }

    #[test]
    fn upgrade_cost_indexes_from_current_level() {
        let b = BuildingType {
            name: "shop".into(),
            cost: 300,
            income_rate_bp: 700,
            upgrade_costs: vec![200, 350, 550],
            tax_rates_bp: vec![1200],
        };
        assert_eq!(b.upgrade_cost_from(1), Some(200));
        assert_eq!(b.upgrade_cost_from(3), Some(550));
        // Past the table: reuse the last defined cost (architect level 5).
        assert_eq!(b.upgrade_cost_from(4), Some(550));
        assert_eq!(b.upgrade_cost_from(0), None);
    }
}
