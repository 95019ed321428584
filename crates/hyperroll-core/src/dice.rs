use hyperroll_protocol::{DiceMode, DuelChoice, Rps};

use crate::rng::GameRng;

/// A finished dice roll: the faces shown plus the duel hand they encode.
///
/// The sign always agrees with the dice: `(die1 + die2) % 3` maps onto the
/// sign and doubles are the special rolls, so the presentation layer can
/// animate the faces and trust the hand to match. `die2 == 0` marks a
/// single-die roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiceRoll {
    pub die1: u8,
    pub die2: u8,
    pub choice: DuelChoice,
}

impl DiceRoll {
    #[inline]
    pub fn sum(&self) -> u8 {
        self.die1 + self.die2
    }

    /// Number of sixes shown, for the box-cars quest.
    #[inline]
    pub fn sixes(&self) -> i64 {
        (self.die1 == 6) as i64 + (self.die2 == 6) as i64
    }
}

/// Face range for a mode. Rigged constrains the first die, not the range.
fn die_range(mode: DiceMode) -> (u8, u8) {
    match mode {
        DiceMode::Tiny => (1, 3),
        DiceMode::Giant => (4, 6),
        DiceMode::Normal | DiceMode::Rigged => (1, 6),
    }
}

/// All non-double pairs in range whose sum maps onto `sign`.
fn plain_pairs(sign: Rps, mode: DiceMode) -> Vec<(u8, u8)> {
    let (lo, hi) = die_range(mode);
    let mut pairs = Vec::new();
    for d1 in lo..=hi {
        for d2 in lo..=hi {
            if d1 != d2 && (d1 + d2) % 3 == sign.index() {
                pairs.push((d1, d2));
            }
        }
    }
    pairs
}

/// All doubles in range whose sum maps onto `sign`.
fn special_pairs(sign: Rps, mode: DiceMode) -> Vec<(u8, u8)> {
    let (lo, hi) = die_range(mode);
    (lo..=hi)
        .filter(|d| (d * 2) % 3 == sign.index())
        .map(|d| (d, d))
        .collect()
}

/// Roll a pair consistent with a chosen sign.
///
/// Whether the roll is special is decided up front (`force_special`, else a
/// `special_chance_bp` draw) and the dice are sampled from the matching
/// table. Under rigged dice a special is always boxcars, so the sign
/// collapses to whatever the dice show.
pub fn roll_for_sign(
    rng: &mut GameRng,
    sign: Rps,
    mode: DiceMode,
    force_special: bool,
    special_chance_bp: i32,
) -> DiceRoll {
    let special = force_special || rng.chance_bp(special_chance_bp);

    if mode == DiceMode::Rigged {
        let (die2, is_special) = if special {
            (6, true)
        } else {
            // Second die made to match the sign; 6 is reserved for specials.
            let faces: Vec<u8> = (1..=5).filter(|d| (6 + d) % 3 == sign.index()).collect();
            (*rng.pick(&faces).unwrap_or(&1), false)
        };
        let sign = Rps::from_index(6 + die2);
        return DiceRoll {
            die1: 6,
            die2,
            choice: DuelChoice {
                sign,
                is_special,
            },
        };
    }

    let table = if special {
        special_pairs(sign, mode)
    } else {
        plain_pairs(sign, mode)
    };
    let (die1, die2) = *rng
        .pick(&table)
        .unwrap_or(&(sign.index() + 1, sign.index() + 1));
    DiceRoll {
        die1,
        die2,
        choice: DuelChoice {
            sign,
            is_special: special,
        },
    }
}

/// Roll free dice: both faces uniform, the hand read off the result. Doubles
/// are the special rolls. `force_special` turns the roll into a uniform
/// double instead.
pub fn roll_free(rng: &mut GameRng, mode: DiceMode, force_special: bool) -> DiceRoll {
    let (lo, hi) = die_range(mode);

    if mode == DiceMode::Rigged {
        let die2 = if force_special { 6 } else { rng.roll_die() };
        return DiceRoll {
            die1: 6,
            die2,
            choice: DuelChoice {
                sign: Rps::from_index(6 + die2),
                is_special: die2 == 6,
            },
        };
    }

    let (die1, die2) = if force_special {
        let d = lo + rng.gen_below((hi - lo + 1) as u32) as u8;
        (d, d)
    } else {
        (
            lo + rng.gen_below((hi - lo + 1) as u32) as u8,
            lo + rng.gen_below((hi - lo + 1) as u32) as u8,
        )
    };
    DiceRoll {
        die1,
        die2,
        choice: DuelChoice {
            sign: Rps::from_index(die1 + die2),
            is_special: die1 == die2,
        },
    }
}

/// Roll one die (the lost-focus penalty). The face alone picks the sign and
/// a single die can never be special.
pub fn roll_single(rng: &mut GameRng, mode: DiceMode) -> DiceRoll {
    let die1 = if mode == DiceMode::Rigged {
        6
    } else {
        let (lo, hi) = die_range(mode);
        lo + rng.gen_below((hi - lo + 1) as u32) as u8
    };
    DiceRoll {
        die1,
        die2: 0,
        choice: DuelChoice {
            sign: Rps::from_index(die1),
            is_special: false,
        },
    }
}
