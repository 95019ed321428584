use hyperroll_protocol::{
    BlessingType, CharacterId, CharacterPassive, CurseType, PlayerId, PlayerSnapshot,
};

use crate::rules::CompiledRules;

/// Baseline starting money; the Major starts with double.
pub const BASE_STARTING_MONEY: i64 = 1500;

/// Default special-roll chance, 1/6 in basis points.
pub const BASE_SPECIAL_CHANCE_BP: i32 = 1667;

/// A player: economic state plus the passive-ability state bag.
///
/// Human vs. bot is a policy attached to the id in the engine, not a
/// different type here.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub character: CharacterId,
    pub money: i64,
    pub path_position: usize,
    pub passive: PassiveState,
}

impl Player {
    pub fn new(id: PlayerId, character: CharacterId, rules: &CompiledRules) -> Self {
        let passive_kind = rules.character(character).passive;
        let money = if passive_kind == CharacterPassive::Major {
            BASE_STARTING_MONEY * 2
        } else {
            BASE_STARTING_MONEY
        };
        Self {
            id,
            character,
            money,
            path_position: 0,
            passive: PassiveState::default(),
        }
    }

    pub fn passive_kind(&self, rules: &CompiledRules) -> CharacterPassive {
        rules.character(self.character).passive
    }

    pub fn is(&self, rules: &CompiledRules, passive: CharacterPassive) -> bool {
        self.passive_kind(rules) == passive
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            character: self.character,
            money: self.money,
            path_position: self.path_position,
            win_streak: self.passive.win_streak,
            blessings: self.passive.blessings.clone(),
            curses: self.passive.curses.clone(),
        }
    }
}

/// The grab-bag of counters, flags and collections behind every passive
/// ability and status effect. All mutation happens through named operations
/// so the invariants stay auditable.
#[derive(Clone, Debug)]
pub struct PassiveState {
    // Duel bookkeeping
    pub win_streak: u32,
    pub duels_since_special: u32,
    pub negotiator_tokens: u32,
    pub gambler_treasure: u32,
    pub pacifist_tie_bonus: i64,

    // Board bookkeeping
    pub laps_completed: u32,
    pub eventer_cards_drawn: u32,

    // Acquired sets: each variant at most once.
    pub blessings: Vec<BlessingType>,
    pub curses: Vec<CurseType>,

    // One-shot flags
    pub has_tax_immunity: bool,
    pub has_guaranteed_win: bool,
    pub has_overwhelming_power: bool,
    pub is_afk: bool,
    pub thief_lap_is_clean: bool,
    pub will_steal_next_income: bool,

    // Timed counters (decremented at round end)
    pub chaos_duels: u32,
    pub single_die_duels: u32,

    // Blessing accumulators
    pub tax_multiplier_bp: i32,
    pub bonus_steps_pool: u32,
    pub five_counter: u32,
    pub special_chance_bp: i32,
}

impl Default for PassiveState {
    fn default() -> Self {
        Self {
            win_streak: 0,
            duels_since_special: 0,
            negotiator_tokens: 0,
            gambler_treasure: 0,
            pacifist_tie_bonus: 50,
            laps_completed: 0,
            eventer_cards_drawn: 0,
            blessings: Vec::new(),
            curses: Vec::new(),
            has_tax_immunity: false,
            has_guaranteed_win: false,
            has_overwhelming_power: false,
            is_afk: false,
            thief_lap_is_clean: true,
            will_steal_next_income: false,
            chaos_duels: 0,
            single_die_duels: 0,
            tax_multiplier_bp: 0,
            bonus_steps_pool: 0,
            five_counter: 0,
            special_chance_bp: BASE_SPECIAL_CHANCE_BP,
        }
    }
}

impl PassiveState {
    #[inline]
    pub fn has_blessing(&self, blessing: BlessingType) -> bool {
        self.blessings.contains(&blessing)
    }

    #[inline]
    pub fn has_curse(&self, curse: CurseType) -> bool {
        self.curses.contains(&curse)
    }

    /// Record a blessing. Returns false if already held (the caller should
    /// redirect to a random unowned variant instead).
    pub fn add_blessing(&mut self, blessing: BlessingType) -> bool {
        if self.has_blessing(blessing) {
            return false;
        }
        self.blessings.push(blessing);
        true
    }

    /// Record a curse. Returns false if already held.
    pub fn add_curse(&mut self, curse: CurseType) -> bool {
        if self.has_curse(curse) {
            return false;
        }
        self.curses.push(curse);
        true
    }

    pub fn lift_curse(&mut self, curse: CurseType) -> bool {
        let before = self.curses.len();
        self.curses.retain(|c| *c != curse);
        self.curses.len() != before
    }

    pub fn clear_curses(&mut self) -> Vec<CurseType> {
        std::mem::take(&mut self.curses)
    }

    /// Drop all blessings and the state they carried.
    pub fn clear_blessings(&mut self) {
        self.blessings.clear();
        self.tax_multiplier_bp = 0;
        self.bonus_steps_pool = 0;
        self.five_counter = 0;
        self.special_chance_bp = BASE_SPECIAL_CHANCE_BP;
    }

    pub fn record_duel_win(&mut self) {
        self.win_streak += 1;
    }

    pub fn record_duel_loss(&mut self) {
        self.win_streak = 0;
    }

    /// Duelist streak multiplier on money received: x2 at 3 wins, x5 at 5.
    pub fn streak_multiplier(&self) -> i64 {
        if self.win_streak >= 5 {
            5
        } else if self.win_streak >= 3 {
            2
        } else {
            1
        }
    }

    /// Consume the one-shot tax immunity if held.
    pub fn take_tax_immunity(&mut self) -> bool {
        std::mem::take(&mut self.has_tax_immunity)
    }

    pub fn take_guaranteed_win(&mut self) -> bool {
        std::mem::take(&mut self.has_guaranteed_win)
    }

    pub fn take_overwhelming_power(&mut self) -> bool {
        std::mem::take(&mut self.has_overwhelming_power)
    }

    pub fn take_afk(&mut self) -> bool {
        std::mem::take(&mut self.is_afk)
    }

    pub fn take_income_steal(&mut self) -> bool {
        std::mem::take(&mut self.will_steal_next_income)
    }

    /// The pacifist's payout for forfeiting a would-be win; grows each time.
    pub fn take_pacifist_bonus(&mut self) -> i64 {
        let bonus = self.pacifist_tie_bonus;
        self.pacifist_tie_bonus += 25;
        bonus
    }

    /// Bank a gambler treasure; returns the new total.
    pub fn bank_treasure(&mut self, value: u32) -> u32 {
        self.gambler_treasure += value;
        self.gambler_treasure
    }

    /// Cash out the gambler's treasure at tiered rates.
    pub fn cash_out_treasure(&mut self) -> i64 {
        let value = std::mem::take(&mut self.gambler_treasure) as i64;
        let per_value = if value >= 20 {
            30
        } else if value >= 10 {
            20
        } else {
            10
        };
        value * per_value
    }

    pub fn tick_round_end(&mut self) {
        self.chaos_duels = self.chaos_duels.saturating_sub(1);
        self.single_die_duels = self.single_die_duels.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blessing_set_rejects_duplicates() {
        let mut state = PassiveState::default();
        assert!(state.add_blessing(BlessingType::Toll));
        assert!(!state.add_blessing(BlessingType::Toll));
        assert_eq!(state.blessings.len(), 1);
    }

    #[test]
    fn curse_set_rejects_duplicates() {
        let mut state = PassiveState::default();
        assert!(state.add_curse(CurseType::Drought));
        assert!(!state.add_curse(CurseType::Drought));
        assert!(state.lift_curse(CurseType::Drought));
        assert!(!state.lift_curse(CurseType::Drought));
    }

    #[test]
    fn streak_multiplier_thresholds() {
        let mut state = PassiveState::default();
        assert_eq!(state.streak_multiplier(), 1);
        for _ in 0..3 {
            state.record_duel_win();
        }
        assert_eq!(state.streak_multiplier(), 2);
        state.record_duel_win();
        state.record_duel_win();
        assert_eq!(state.streak_multiplier(), 5);
        state.record_duel_loss();
        assert_eq!(state.streak_multiplier(), 1);
    }

    #[test]
    fn gambler_cash_out_tiers() {
        let mut state = PassiveState::default();
        state.bank_treasure(5);
        assert_eq!(state.cash_out_treasure(), 50);
        state.bank_treasure(12);
        assert_eq!(state.cash_out_treasure(), 240);
        state.bank_treasure(21);
        assert_eq!(state.cash_out_treasure(), 630);
        assert_eq!(state.gambler_treasure, 0);
    }

    #[test]
    fn pacifist_bonus_grows() {
        let mut state = PassiveState::default();
        assert_eq!(state.take_pacifist_bonus(), 50);
        assert_eq!(state.take_pacifist_bonus(), 75);
        assert_eq!(state.take_pacifist_bonus(), 100);
    }

    #[test]
    fn one_shot_flags_consume() {
        let mut state = PassiveState::default();
        state.has_guaranteed_win = true;
        assert!(state.take_guaranteed_win());
        assert!(!state.take_guaranteed_win());
    }
}
