use hyperroll_protocol::{
    BlessingType, CardCategory, CharacterPassive, CurseType, DiceMode, Event, PlayerId,
};

use crate::board::Board;
use crate::economy;
use crate::player::Player;
use crate::quest::{QuestLog, QuestUpdate};
use crate::rng::GameRng;
use crate::rules::{CardEffect, CompiledRules};

/// Extra special-roll chance the Fortune blessing adds, basis points.
pub const FORTUNE_BONUS_BP: i32 = 1_000;

/// Movement steps the Stride blessing banks on grant.
pub const STRIDE_BONUS_STEPS: u32 = 6;

/// Default draw weights: good / bad / unknown.
pub const BASE_CARD_WEIGHTS: [u32; 3] = [40, 20, 40];

/// Everything a card effect may touch, borrowed from the game state for the
/// duration of one draw.
pub struct EffectCtx<'a> {
    pub rules: &'a CompiledRules,
    pub board: &'a mut Board,
    pub players: &'a mut [Player; 2],
    pub quests: &'a mut QuestLog,
    pub rng: &'a mut GameRng,
    pub dice_mode: &'a mut DiceMode,
    pub rigged_player: &'a mut Option<PlayerId>,
    pub stage: u8,
    pub events: &'a mut Vec<Event>,
}

impl EffectCtx<'_> {
    fn log(&mut self, text: impl Into<String>) {
        self.events.push(Event::LogMessage { text: text.into() });
    }

    pub fn add_money(&mut self, player: PlayerId, delta: i64) {
        let p = &mut self.players[player.index()];
        p.money += delta;
        self.events.push(Event::MoneyChanged {
            player,
            money: p.money,
        });
    }

    fn tile_changed(&mut self, index: usize) {
        if let Some(tile) = self.board.tile_at(index) {
            self.events.push(Event::TileChanged {
                tile: tile.snapshot(index),
            });
        }
    }
}

/// Draw weights for a player: the Eventer's deck warms up with lifetime
/// draws, everyone else uses the base split.
pub fn category_weights(passive: CharacterPassive, draws: u32) -> [u32; 3] {
    if passive == CharacterPassive::Eventer {
        if draws >= 15 {
            return [60, 0, 40];
        }
        if draws >= 5 {
            return [50, 10, 40];
        }
    }
    BASE_CARD_WEIGHTS
}

fn pick_category(rng: &mut GameRng, weights: [u32; 3]) -> CardCategory {
    let total: u32 = weights.iter().sum();
    let mut roll = rng.gen_below(total);
    for (i, w) in weights.iter().enumerate() {
        if roll < *w {
            return match i {
                0 => CardCategory::Good,
                1 => CardCategory::Bad,
                _ => CardCategory::Unknown,
            };
        }
        roll -= w;
    }
    CardCategory::Unknown
}

/// Draw a card for `player`: weighted category, uniform pick within the
/// deck, then the effect applied immediately.
pub fn draw_card(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    let passive = ctx.players[player.index()].passive_kind(ctx.rules);
    let draws = ctx.players[player.index()].passive.eventer_cards_drawn;
    let category = pick_category(ctx.rng, category_weights(passive, draws));
    draw_from_category(ctx, player, category);
}

/// Draw from a specific deck, bypassing the category weights.
pub fn draw_from_category(ctx: &mut EffectCtx<'_>, player: PlayerId, category: CardCategory) {
    let Some(&card_id) = ctx.rng.pick(ctx.rules.decks.deck(category)) else {
        return;
    };
    let card = ctx.rules.card(card_id);
    let (title, effect) = (card.title.clone(), card.effect.clone());
    ctx.players[player.index()].passive.eventer_cards_drawn += 1;
    ctx.events.push(Event::CardDrawn {
        player,
        card: card_id,
        title,
        category,
    });
    apply_effect(ctx, player, &effect);
}

/// Interpret one card effect against the game state.
pub fn apply_effect(ctx: &mut EffectCtx<'_>, player: PlayerId, effect: &CardEffect) {
    let stage_scale = ctx.stage as i64 + 1;
    match effect {
        CardEffect::GainMoney { amount } => {
            ctx.add_money(player, amount * stage_scale);
        }
        CardEffect::LoseMoneyFifth => {
            let loss = ctx.players[player.index()].money / 5;
            ctx.add_money(player, -loss);
        }
        CardEffect::GainMoneyPerBuilding { flat, per_building } => {
            let owned = ctx.board.tiles_owned_by(player).len() as i64;
            ctx.add_money(player, (flat + per_building * owned) * stage_scale);
        }
        CardEffect::GainMoneyPerLap { base, per_lap } => {
            let laps = ctx.players[player.index()].passive.laps_completed as i64;
            ctx.add_money(player, base + per_lap * laps);
        }
        CardEffect::GrantTaxImmunity => {
            ctx.players[player.index()].passive.has_tax_immunity = true;
            ctx.log("The next tax bill is waived.");
        }
        CardEffect::GrantGuaranteedWin => {
            ctx.players[player.index()].passive.has_guaranteed_win = true;
        }
        CardEffect::GrantBlessing { blessing } => {
            grant_blessing(ctx, player, *blessing);
        }
        CardEffect::GrantRandomBlessing => {
            grant_random_blessing(ctx, player);
        }
        CardEffect::MixedBlessing => {
            grant_random_blessing(ctx, player);
            inflict_random_curse(ctx, player);
        }
        CardEffect::InflictCurse { curse } => {
            inflict_curse(ctx, player, *curse);
        }
        CardEffect::InflictRandomCurse => {
            inflict_random_curse(ctx, player);
        }
        CardEffect::GambleCurse => {
            let held = ctx.players[player.index()].passive.curses.clone();
            match ctx.rng.pick(&held).copied() {
                Some(curse) => lift_curse(ctx, player, curse),
                None => inflict_random_curse(ctx, player),
            }
        }
        CardEffect::RemoveAllCurses => {
            for curse in ctx.players[player.index()].passive.clear_curses() {
                ctx.events.push(Event::CurseLifted { player, curse });
            }
        }
        CardEffect::RemoveAllBlessings => {
            ctx.players[player.index()].passive.clear_blessings();
            ctx.log("Every blessing is forgotten.");
        }
        CardEffect::StartQuest {
            kind,
            target,
            reward,
        } => {
            if ctx.quests.start(*kind, *target, *reward) {
                ctx.events.push(Event::QuestStarted {
                    kind: *kind,
                    target: *target,
                    reward: *reward,
                });
            }
        }
        CardEffect::SeizeRandomProperty => {
            let targets = ctx.board.tiles_owned_by(player.opponent());
            if let Some(&index) = ctx.rng.pick(&targets) {
                ctx.board.set_owner(index, player);
                ctx.tile_changed(index);
                ctx.log("A property changes hands.");
            }
        }
        CardEffect::SellAllBuildings { multiplier_bp } => {
            let owned = ctx.board.tiles_owned_by(player);
            let mut proceeds = 0;
            for index in owned {
                if let Some(tile) = ctx.board.tile_at(index) {
                    proceeds += economy::sell_value(ctx.rules, tile, *multiplier_bp);
                }
                ctx.board.reset_tile(index);
                ctx.tile_changed(index);
            }
            if proceeds > 0 {
                ctx.add_money(player, proceeds);
            }
        }
        CardEffect::UpgradeOrBuild { fallback } => {
            upgrade_or_build(ctx, player, fallback);
        }
        CardEffect::DrawGoodAndBad => {
            draw_from_category(ctx, player, CardCategory::Good);
            draw_from_category(ctx, player, CardCategory::Bad);
        }
        CardEffect::SetDiceMode { mode } => {
            *ctx.dice_mode = *mode;
            // Rigged dice load only the drawer's rolls; the size modes are
            // table-wide.
            *ctx.rigged_player = (*mode == DiceMode::Rigged).then_some(player);
        }
        CardEffect::Afk => {
            ctx.players[player.index()].passive.is_afk = true;
        }
        CardEffect::SingleDice { duels } => {
            ctx.players[player.index()].passive.single_die_duels = *duels;
        }
        CardEffect::ChaosDuel { duels } => {
            ctx.players[player.index()].passive.chaos_duels = *duels;
        }
        CardEffect::BalanceMoney => {
            let total = ctx.players[0].money + ctx.players[1].money;
            let share = total / 2;
            for id in [PlayerId(0), PlayerId(1)] {
                let delta = share - ctx.players[id.index()].money;
                if delta != 0 {
                    ctx.add_money(id, delta);
                }
            }
        }
        CardEffect::GrantOverwhelmingPower => {
            ctx.players[player.index()].passive.has_overwhelming_power = true;
        }
    }
}

fn upgrade_or_build(ctx: &mut EffectCtx<'_>, player: PlayerId, fallback: &str) {
    let cap = economy::max_level(ctx.rules, &ctx.players[player.index()]);
    let upgradable: Vec<usize> = ctx
        .board
        .tiles_owned_by(player)
        .into_iter()
        .filter(|&i| ctx.board.tile_at(i).map_or(false, |t| t.level < cap))
        .collect();
    if let Some(&index) = ctx.rng.pick(&upgradable) {
        let new_level = ctx.board.tile_at(index).map_or(1, |t| t.level + 1);
        ctx.board.set_level(index, new_level);
        ctx.events.push(Event::BuildingUpgraded {
            player,
            tile: index,
            new_level,
            cost: 0,
        });
        ctx.tile_changed(index);
        return;
    }
    // Nothing to upgrade: raise the fallback building for free instead.
    // The Major never builds, not even for free.
    if ctx.players[player.index()].is(ctx.rules, CharacterPassive::Major) {
        return;
    }
    let Some(building) = ctx.rules.building_id(fallback) else {
        return;
    };
    let empty = ctx.board.buildable_empty_tiles();
    if let Some(&index) = ctx.rng.pick(&empty) {
        ctx.board.place_building(index, player, building, 1);
        ctx.events.push(Event::BuildingBuilt {
            player,
            tile: index,
            building,
            cost: 0,
        });
        ctx.tile_changed(index);
    }
}

/// Grant a blessing, redirecting duplicates to a random unheld one. A sixth
/// distinct mundane blessing grants Ascension on the spot.
pub fn grant_blessing(ctx: &mut EffectCtx<'_>, player: PlayerId, blessing: BlessingType) {
    let blessing = if ctx.players[player.index()].passive.has_blessing(blessing) {
        let unheld: Vec<BlessingType> = BlessingType::MUNDANE
            .into_iter()
            .filter(|b| !ctx.players[player.index()].passive.has_blessing(*b))
            .collect();
        match ctx.rng.pick(&unheld).copied() {
            Some(b) => b,
            None => return,
        }
    } else {
        blessing
    };
    if !ctx.players[player.index()].passive.add_blessing(blessing) {
        return;
    }
    ctx.events.push(Event::BlessingGranted { player, blessing });

    match blessing {
        BlessingType::Fortune => {
            ctx.players[player.index()].passive.special_chance_bp += FORTUNE_BONUS_BP;
        }
        BlessingType::Stride => {
            ctx.players[player.index()].passive.bonus_steps_pool += STRIDE_BONUS_STEPS;
        }
        BlessingType::Foundation => {
            free_foundation_building(ctx, player);
        }
        _ => {}
    }

    let mundane_held = BlessingType::MUNDANE
        .into_iter()
        .filter(|b| ctx.players[player.index()].passive.has_blessing(*b))
        .count();
    if mundane_held == BlessingType::MUNDANE.len() {
        ascend(ctx, player);
    }
}

pub fn grant_random_blessing(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    let unheld: Vec<BlessingType> = BlessingType::MUNDANE
        .into_iter()
        .filter(|b| !ctx.players[player.index()].passive.has_blessing(*b))
        .collect();
    if let Some(&blessing) = ctx.rng.pick(&unheld) {
        grant_blessing(ctx, player, blessing);
    }
}

fn free_foundation_building(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    if ctx.players[player.index()].is(ctx.rules, CharacterPassive::Major) {
        return;
    }
    let empty = ctx.board.buildable_empty_tiles();
    let Some(&index) = ctx.rng.pick(&empty) else {
        return;
    };
    let choices: Vec<u16> = (0..ctx.rules.buildings.len() as u16).collect();
    if let Some(&raw) = ctx.rng.pick(&choices) {
        let building = hyperroll_protocol::BuildingTypeId::new(raw);
        ctx.board.place_building(index, player, building, 1);
        ctx.events.push(Event::BuildingBuilt {
            player,
            tile: index,
            building,
            cost: 0,
        });
        ctx.tile_changed(index);
    }
}

/// The ultimate blessing: the board is wiped and every buildable tile is
/// rebuilt at the ascended player's level cap.
fn ascend(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    if !ctx.players[player.index()]
        .passive
        .add_blessing(BlessingType::Ascension)
    {
        return;
    }
    ctx.events.push(Event::Ascension { player });
    ctx.events.push(Event::BlessingGranted {
        player,
        blessing: BlessingType::Ascension,
    });
    ctx.board.reset_all_tiles();
    let cap = economy::max_level(ctx.rules, &ctx.players[player.index()]);
    let building_count = ctx.rules.buildings.len() as u32;
    for index in ctx.board.buildable_empty_tiles() {
        let raw = ctx.rng.gen_below(building_count) as u16;
        let building = hyperroll_protocol::BuildingTypeId::new(raw);
        ctx.board.place_building(index, player, building, cap);
        ctx.tile_changed(index);
    }
}

/// Inflict a curse, redirecting duplicates to a random unheld one. A third
/// distinct curse does not stick: it sets off the doom cascade instead.
pub fn inflict_curse(ctx: &mut EffectCtx<'_>, player: PlayerId, curse: CurseType) {
    let curse = if ctx.players[player.index()].passive.has_curse(curse) {
        let unheld: Vec<CurseType> = CurseType::ALL
            .into_iter()
            .filter(|c| !ctx.players[player.index()].passive.has_curse(*c))
            .collect();
        match ctx.rng.pick(&unheld).copied() {
            Some(c) => c,
            None => return,
        }
    } else {
        curse
    };
    if !ctx.players[player.index()].passive.add_curse(curse) {
        return;
    }
    ctx.events.push(Event::CurseInflicted { player, curse });

    if ctx.players[player.index()].passive.curses.len() >= 3 {
        doom_cascade(ctx, player);
    }
}

pub fn inflict_random_curse(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    let unheld: Vec<CurseType> = CurseType::ALL
        .into_iter()
        .filter(|c| !ctx.players[player.index()].passive.has_curse(*c))
        .collect();
    if let Some(&curse) = ctx.rng.pick(&unheld) {
        inflict_curse(ctx, player, curse);
    }
}

pub fn lift_curse(ctx: &mut EffectCtx<'_>, player: PlayerId, curse: CurseType) {
    if ctx.players[player.index()].passive.lift_curse(curse) {
        ctx.events.push(Event::CurseLifted { player, curse });
    }
}

/// Three curses at once: properties razed, money halved, all curses lifted.
fn doom_cascade(ctx: &mut EffectCtx<'_>, player: PlayerId) {
    let owned = ctx.board.tiles_owned_by(player);
    let properties_lost = owned.len();
    for index in owned {
        ctx.board.reset_tile(index);
        ctx.tile_changed(index);
    }
    let loss = ctx.players[player.index()].money / 2;
    if loss > 0 {
        ctx.add_money(player, -loss);
    }
    for curse in ctx.players[player.index()].passive.clear_curses() {
        ctx.events.push(Event::CurseLifted { player, curse });
    }
    ctx.events.push(Event::DoomCascade {
        player,
        properties_lost,
    });
}

/// Route a quest update into player state and the event stream. Rewards
/// recurse into the same grant helpers cards use.
pub fn settle_quest_updates(ctx: &mut EffectCtx<'_>, updates: Vec<QuestUpdate>) {
    for update in updates {
        match update {
            QuestUpdate::Progress {
                player,
                progress,
                target,
                ..
            } => {
                ctx.events.push(Event::QuestProgress {
                    player,
                    progress,
                    target,
                });
            }
            QuestUpdate::Completed {
                kind,
                player,
                reward,
            } => {
                ctx.events.push(Event::QuestCompleted {
                    player,
                    kind,
                    reward,
                });
                match reward {
                    hyperroll_protocol::QuestReward::Money { amount } => {
                        ctx.add_money(player, amount);
                    }
                    hyperroll_protocol::QuestReward::FreeBuilding => {
                        free_foundation_building(ctx, player);
                    }
                    hyperroll_protocol::QuestReward::GoodChanceCard => {
                        draw_from_category(ctx, player, CardCategory::Good);
                    }
                    hyperroll_protocol::QuestReward::RandomBlessing => {
                        grant_random_blessing(ctx, player);
                    }
                    hyperroll_protocol::QuestReward::TaxImmunity => {
                        ctx.players[player.index()].passive.has_tax_immunity = true;
                    }
                    hyperroll_protocol::QuestReward::TaxMultiplierBp { value_bp } => {
                        ctx.players[player.index()].passive.tax_multiplier_bp += value_bp;
                    }
                }
            }
        }
    }
}
