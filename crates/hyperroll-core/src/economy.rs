use hyperroll_protocol::{BlessingType, CharacterPassive, CurseType};

use crate::board::Tile;
use crate::player::Player;
use crate::rules::CompiledRules;

/// Stage-indexed tax multiplier, basis points. Stage 0 is unscaled.
pub const STAGE_TAX_MULTIPLIERS_BP: [i32; 6] =
    [10_000, 15_000, 20_000, 30_000, 40_000, 50_000];

/// Extra basis points the Toll blessing adds to every collected tax.
pub const TOLL_SURCHARGE_BP: i32 = 5_000;

/// Highest stage the game reaches.
pub const MAX_STAGE: u8 = 5;

/// `amount * bp / 10000`, rounded half-up. All percentage math in the
/// engine goes through here so rounding stays consistent.
#[inline]
pub fn apply_bp(amount: i64, bp: i32) -> i64 {
    (amount * bp as i64 + 5_000).div_euclid(10_000)
}

pub fn stage_tax_multiplier_bp(stage: u8) -> i32 {
    let index = (stage as usize).min(STAGE_TAX_MULTIPLIERS_BP.len() - 1);
    STAGE_TAX_MULTIPLIERS_BP[index]
}

/// Level cap: 4 for everyone, 5 for the Architect.
pub fn max_level(rules: &CompiledRules, player: &Player) -> u8 {
    if player.is(rules, CharacterPassive::Architect) {
        5
    } else {
        4
    }
}

/// A fully-assessed tax: the raw rate-based amount plus what actually leaves
/// the payer and what actually reaches the receiver after curses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaxBill {
    pub base: i64,
    /// Post-multiplier amount; solvency is judged against this, before the
    /// Extortion surcharge splits the debit from it.
    pub assessed: i64,
    pub debited: i64,
    pub credited: i64,
}

/// Price a landing on the receiver's tile.
///
/// The pipeline, in order: rate on the (possibly depreciated) level, stage
/// multiplier plus the receiver's surcharges, Major payer doubling, Duelist
/// receiver streak multiplier, then the payer-side Extortion doubling and
/// receiver-side Recession halving which split debit from credit.
/// Returns `None` for an unbuilt tile.
pub fn assess_tax(
    rules: &CompiledRules,
    tile: &Tile,
    stage: u8,
    payer: &Player,
    receiver: &Player,
) -> Option<TaxBill> {
    let building = rules.building(tile.building?);
    let effective_level = if receiver.passive.has_curse(CurseType::Depreciation) {
        tile.level.min(2)
    } else {
        tile.level
    };
    let base = apply_bp(building.cost, building.tax_rate_bp(effective_level));

    let mut multiplier_bp = stage_tax_multiplier_bp(stage) + receiver.passive.tax_multiplier_bp;
    if receiver.passive.has_blessing(BlessingType::Toll) {
        multiplier_bp += TOLL_SURCHARGE_BP;
    }
    let mut amount = apply_bp(base, multiplier_bp);

    if payer.is(rules, CharacterPassive::Major) {
        amount *= 2;
    }
    if receiver.is(rules, CharacterPassive::Duelist) {
        amount *= receiver.passive.streak_multiplier();
    }

    let debited = if payer.passive.has_curse(CurseType::Extortion) {
        amount * 2
    } else {
        amount
    };
    let credited = if receiver.passive.has_curse(CurseType::Recession) {
        amount / 2
    } else {
        amount
    };

    Some(TaxBill {
        base,
        assessed: amount,
        debited,
        credited,
    })
}

/// Cost/new-level quote for upgrading a tile the player owns, or `None` if
/// the tile is not theirs, already at their cap, or has no priced upgrade.
/// The Sanction curse is the caller's check: it blocks the offer, not the
/// price.
pub fn upgrade_quote(
    rules: &CompiledRules,
    tile: &Tile,
    player: &Player,
) -> Option<(i64, u8)> {
    if tile.owner != Some(player.id) {
        return None;
    }
    let building = rules.building(tile.building?);
    if tile.level >= max_level(rules, player) {
        return None;
    }
    let cost = building.upgrade_cost_from(tile.level)?;
    Some((cost, tile.level + 1))
}

/// Raw per-tile income: cost times the base rate, doubling with each level.
pub fn tile_income(rules: &CompiledRules, tile: &Tile) -> i64 {
    let Some(id) = tile.building else { return 0 };
    let building = rules.building(id);
    let scaled_cost = building.cost << (tile.level.max(1) - 1);
    apply_bp(scaled_cost, building.income_rate_bp)
}

/// The player's full income sweep across every owned tile, with the
/// Economist doubling, Prosperity bonus, Duelist streak and Recession
/// halving already applied. Drought (which skips the sweep outright) is the
/// caller's check.
pub fn income_sweep(rules: &CompiledRules, tiles: &[&Tile], player: &Player) -> i64 {
    let mut total: i64 = tiles.iter().map(|t| tile_income(rules, t)).sum();

    if player.is(rules, CharacterPassive::Economist) {
        total *= 2;
    }
    if player.passive.has_blessing(BlessingType::Prosperity) {
        total = apply_bp(total, 15_000);
    }
    if player.is(rules, CharacterPassive::Duelist) {
        total *= player.passive.streak_multiplier();
    }
    if player.passive.has_curse(CurseType::Recession) {
        total /= 2;
    }
    total
}

/// Liquidation value of a built tile at `multiplier_bp` of its base cost.
/// Upgrade spend is not refunded.
pub fn sell_value(rules: &CompiledRules, tile: &Tile, multiplier_bp: i32) -> i64 {
    match tile.building {
        Some(id) => apply_bp(rules.building(id).cost, multiplier_bp),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::rules::{load_rules, RulesSource};
    use hyperroll_protocol::PlayerId;

    fn fixture() -> (CompiledRules, Board, Player, Player) {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let board = Board::standard();
        let civilian = rules
            .character_with_passive(CharacterPassive::Civilian)
            .unwrap();
        let p0 = Player::new(PlayerId(0), civilian, &rules);
        let p1 = Player::new(PlayerId(1), civilian, &rules);
        (rules, board, p0, p1)
    }

    #[test]
    fn bp_math_rounds_half_up() {
        assert_eq!(apply_bp(200, 1000), 20);
        assert_eq!(apply_bp(333, 1000), 33);
        assert_eq!(apply_bp(335, 1000), 34);
        assert_eq!(apply_bp(0, 5000), 0);
    }

    #[test]
    fn stage_multiplier_table() {
        assert_eq!(stage_tax_multiplier_bp(0), 10_000);
        assert_eq!(stage_tax_multiplier_bp(1), 15_000);
        assert_eq!(stage_tax_multiplier_bp(5), 50_000);
        assert_eq!(stage_tax_multiplier_bp(9), 50_000);
    }

    #[test]
    fn level_one_house_tax_at_stage_zero() {
        let (rules, mut board, p0, p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        let bill = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &p0, &p1).unwrap();
        // 200 * 10% = 20, unscaled at stage 0.
        assert_eq!(
            bill,
            TaxBill {
                base: 20,
                assessed: 20,
                debited: 20,
                credited: 20
            }
        );
    }

    #[test]
    fn stage_and_toll_scale_the_bill() {
        let (rules, mut board, p0, mut p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        p1.passive.add_blessing(BlessingType::Toll);
        // 20 * (200% + 50%) = 50.
        let bill = assess_tax(&rules, board.tile_at(1).unwrap(), 2, &p0, &p1).unwrap();
        assert_eq!(bill.debited, 50);
    }

    #[test]
    fn depreciation_caps_the_taxed_level() {
        let (rules, mut board, p0, mut p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 4);
        let full = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &p0, &p1).unwrap();
        assert_eq!(full.base, 100); // 200 * 50%
        p1.passive.add_curse(CurseType::Depreciation);
        let capped = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &p0, &p1).unwrap();
        assert_eq!(capped.base, 36); // 200 * 18%, level capped at 2
    }

    #[test]
    fn major_pays_double() {
        let (rules, mut board, _, p1) = fixture();
        let major = rules.character_with_passive(CharacterPassive::Major).unwrap();
        let payer = Player::new(PlayerId(0), major, &rules);
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        let bill = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &payer, &p1).unwrap();
        assert_eq!(bill.debited, 40);
    }

    #[test]
    fn extortion_and_recession_split_debit_from_credit() {
        let (rules, mut board, mut p0, mut p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        p0.passive.add_curse(CurseType::Extortion);
        p1.passive.add_curse(CurseType::Recession);
        let bill = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &p0, &p1).unwrap();
        assert_eq!(bill.debited, 40);
        assert_eq!(bill.credited, 10);
    }

    #[test]
    fn duelist_streak_multiplies_collected_tax() {
        let (rules, mut board, p0, _) = fixture();
        let duelist = rules
            .character_with_passive(CharacterPassive::Duelist)
            .unwrap();
        let mut receiver = Player::new(PlayerId(1), duelist, &rules);
        for _ in 0..5 {
            receiver.passive.record_duel_win();
        }
        let house = rules.building_id("house").unwrap();
        board.place_building(1, receiver.id, house, 1);
        let bill = assess_tax(&rules, board.tile_at(1).unwrap(), 0, &p0, &receiver).unwrap();
        assert_eq!(bill.debited, 100);
    }

    #[test]
    fn income_doubles_per_level() {
        let (rules, mut board, _, p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        board.place_building(2, p1.id, house, 3);
        assert_eq!(tile_income(&rules, board.tile_at(1).unwrap()), 10);
        assert_eq!(tile_income(&rules, board.tile_at(2).unwrap()), 40);
    }

    #[test]
    fn sweep_applies_economist_then_prosperity() {
        let (rules, mut board, _, _) = fixture();
        let economist = rules
            .character_with_passive(CharacterPassive::Economist)
            .unwrap();
        let mut player = Player::new(PlayerId(0), economist, &rules);
        player.passive.add_blessing(BlessingType::Prosperity);
        let house = rules.building_id("house").unwrap();
        board.place_building(1, player.id, house, 1);
        let tiles: Vec<&Tile> = board
            .tiles_owned_by(player.id)
            .into_iter()
            .map(|i| board.tile_at(i).unwrap())
            .collect();
        // 10 base, x2 economist, +50% prosperity.
        assert_eq!(income_sweep(&rules, &tiles, &player), 30);
    }

    #[test]
    fn upgrade_quote_respects_ownership_and_caps() {
        let (rules, mut board, p0, p1) = fixture();
        let house = rules.building_id("house").unwrap();
        board.place_building(1, p1.id, house, 1);
        assert!(upgrade_quote(&rules, board.tile_at(1).unwrap(), &p0).is_none());
        assert_eq!(
            upgrade_quote(&rules, board.tile_at(1).unwrap(), &p1),
            Some((150, 2))
        );
        board.set_level(1, 4);
        assert!(upgrade_quote(&rules, board.tile_at(1).unwrap(), &p1).is_none());

        let architect = rules
            .character_with_passive(CharacterPassive::Architect)
            .unwrap();
        let builder = Player::new(PlayerId(1), architect, &rules);
        assert_eq!(
            upgrade_quote(&rules, board.tile_at(1).unwrap(), &builder),
            Some((400, 5))
        );
    }

    #[test]
    fn sell_value_uses_base_cost_only() {
        let (rules, mut board, _, p1) = fixture();
        let tower = rules.building_id("tower").unwrap();
        board.place_building(3, p1.id, tower, 4);
        assert_eq!(sell_value(&rules, board.tile_at(3).unwrap(), 15_000), 750);
    }
}
