use hyperroll_protocol::{
    CharacterPassive, CurseType, DuelChoice, DuelOutcome, PlayerId,
};

use crate::player::Player;
use crate::rules::CompiledRules;

/// Side effects the override pipeline produced while settling a duel. The
/// engine turns these into log lines and payouts; the flag and token
/// mutations have already happened by the time they are returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuelNote {
    /// A guaranteed-win flag decided the duel.
    GuaranteedWin { player: PlayerId },
    /// Both players held guaranteed wins; both were consumed for nothing.
    GuaranteedWinsCancelled,
    /// A pacifist stood down from a win they had earned.
    PacifistStandDown { player: PlayerId },
    /// An overwhelming-power flag broke a double-special deadlock.
    OverwhelmingPower { player: PlayerId },
    /// Both held overwhelming power; both flags fizzled.
    OverwhelmingPowerCancelled,
    /// A negotiator converted a tie into a win and earned a token.
    NegotiatorTieWin { player: PlayerId },
    /// The misfortune curse turned a tie into a loss for its bearer.
    MisfortuneLoss { player: PlayerId },
    /// A negotiator token downgraded the opponent's special win.
    SpecialDowngraded { by: PlayerId },
}

/// Plain comparison of two hands, no passives involved.
///
/// Different signs follow the standard cycle, with the winner's special flag
/// carried onto the outcome. Matching signs go to a lone special roll, and
/// tie otherwise.
pub fn base_outcome(choices: [DuelChoice; 2]) -> DuelOutcome {
    let [a, b] = choices;
    if a.sign != b.sign {
        let winner = if a.sign.beats() == b.sign {
            PlayerId(0)
        } else {
            PlayerId(1)
        };
        let special = choices[winner.index()].is_special;
        return DuelOutcome::win(winner, special);
    }
    match (a.is_special, b.is_special) {
        (true, false) => DuelOutcome::win(PlayerId(0), true),
        (false, true) => DuelOutcome::win(PlayerId(1), true),
        _ => DuelOutcome::TIE,
    }
}

/// Settle a duel through the full override pipeline.
///
/// Order matters and is fixed: guaranteed wins, the pacifist stand-down,
/// overwhelming power, the negotiator tie conversion, the misfortune curse,
/// and finally the negotiator token downgrade of an enemy special win. Each
/// stage sees the outcome the previous stage produced.
pub fn resolve(
    rules: &CompiledRules,
    players: &mut [Player; 2],
    choices: [DuelChoice; 2],
) -> (DuelOutcome, Vec<DuelNote>) {
    let mut notes = Vec::new();
    let passives = [
        players[0].passive_kind(rules),
        players[1].passive_kind(rules),
    ];
    let mut outcome = base_outcome(choices);

    // Guaranteed wins trump the dice entirely. Two at once annihilate.
    let guaranteed = [
        players[0].passive.take_guaranteed_win(),
        players[1].passive.take_guaranteed_win(),
    ];
    match guaranteed {
        [true, true] => {
            notes.push(DuelNote::GuaranteedWinsCancelled);
        }
        [true, false] => {
            outcome = DuelOutcome::win(PlayerId(0), false);
            notes.push(DuelNote::GuaranteedWin { player: PlayerId(0) });
            return (outcome, notes);
        }
        [false, true] => {
            outcome = DuelOutcome::win(PlayerId(1), false);
            notes.push(DuelNote::GuaranteedWin { player: PlayerId(1) });
            return (outcome, notes);
        }
        _ => {}
    }

    // Pacifist: matching signs always tie. A forfeited win is noted so the
    // engine can pay the stand-down bonus.
    if choices[0].sign == choices[1].sign
        && passives.contains(&CharacterPassive::Pacifist)
    {
        if let Some(winner) = outcome.winner {
            if passives[winner.index()] == CharacterPassive::Pacifist {
                notes.push(DuelNote::PacifistStandDown { player: winner });
            }
            outcome = DuelOutcome::TIE;
        }
    }

    // Overwhelming power breaks a both-special deadlock for its holder.
    if outcome.is_tie() && choices[0].is_special && choices[1].is_special {
        let overwhelming = [
            players[0].passive.has_overwhelming_power,
            players[1].passive.has_overwhelming_power,
        ];
        match overwhelming {
            [true, true] => {
                players[0].passive.take_overwhelming_power();
                players[1].passive.take_overwhelming_power();
                notes.push(DuelNote::OverwhelmingPowerCancelled);
            }
            [true, false] => {
                players[0].passive.take_overwhelming_power();
                outcome = DuelOutcome::win(PlayerId(0), true);
                notes.push(DuelNote::OverwhelmingPower { player: PlayerId(0) });
            }
            [false, true] => {
                players[1].passive.take_overwhelming_power();
                outcome = DuelOutcome::win(PlayerId(1), true);
                notes.push(DuelNote::OverwhelmingPower { player: PlayerId(1) });
            }
            _ => {}
        }
    }

    // Negotiator turns a surviving tie into a win and banks a token. With
    // two negotiators the tie stands.
    if outcome.is_tie() {
        let negotiators = [
            passives[0] == CharacterPassive::Negotiator,
            passives[1] == CharacterPassive::Negotiator,
        ];
        if negotiators[0] != negotiators[1] {
            let winner = if negotiators[0] { PlayerId(0) } else { PlayerId(1) };
            players[winner.index()].passive.negotiator_tokens += 1;
            outcome = DuelOutcome::win(winner, false);
            notes.push(DuelNote::NegotiatorTieWin { player: winner });
        }
    }

    // Misfortune: the cursed player loses ties. Both cursed cancels out, and
    // a negotiator never reaches this stage with a tie in hand.
    if outcome.is_tie() {
        let cursed = [
            players[0].passive.has_curse(CurseType::Misfortune)
                && passives[0] != CharacterPassive::Negotiator,
            players[1].passive.has_curse(CurseType::Misfortune)
                && passives[1] != CharacterPassive::Negotiator,
        ];
        if cursed[0] != cursed[1] {
            let loser = if cursed[0] { PlayerId(0) } else { PlayerId(1) };
            outcome = DuelOutcome::win(loser.opponent(), false);
            notes.push(DuelNote::MisfortuneLoss { player: loser });
        }
    }

    // A negotiator token blunts an enemy special win down to a normal one.
    if let Some(winner) = outcome.winner {
        if outcome.is_special_win {
            let defender = winner.opponent();
            if passives[defender.index()] == CharacterPassive::Negotiator
                && players[defender.index()].passive.negotiator_tokens > 0
            {
                players[defender.index()].passive.negotiator_tokens -= 1;
                outcome.is_special_win = false;
                notes.push(DuelNote::SpecialDowngraded { by: defender });
            }
        }
    }

    (outcome, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{load_rules, RulesSource};
    use hyperroll_protocol::Rps;

    fn hand(sign: Rps, special: bool) -> DuelChoice {
        DuelChoice {
            sign,
            is_special: special,
        }
    }

    fn pair(rules: &CompiledRules, a: CharacterPassive, b: CharacterPassive) -> [Player; 2] {
        [
            Player::new(PlayerId(0), rules.character_with_passive(a).unwrap(), rules),
            Player::new(PlayerId(1), rules.character_with_passive(b).unwrap(), rules),
        ]
    }

    #[test]
    fn base_outcome_is_antisymmetric() {
        let signs = [Rps::Rock, Rps::Paper, Rps::Scissors];
        for a in signs {
            for b in signs {
                for sa in [false, true] {
                    for sb in [false, true] {
                        let fwd = base_outcome([hand(a, sa), hand(b, sb)]);
                        let rev = base_outcome([hand(b, sb), hand(a, sa)]);
                        match fwd.winner {
                            None => assert!(rev.is_tie()),
                            Some(w) => {
                                assert_eq!(rev.winner, Some(w.opponent()));
                                assert_eq!(rev.is_special_win, fwd.is_special_win);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn lone_special_breaks_a_matching_sign() {
        let out = base_outcome([hand(Rps::Rock, true), hand(Rps::Rock, false)]);
        assert_eq!(out, DuelOutcome::win(PlayerId(0), true));
        let out = base_outcome([hand(Rps::Rock, true), hand(Rps::Rock, true)]);
        assert!(out.is_tie());
    }

    #[test]
    fn guaranteed_wins_cancel_each_other() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Civilian, CharacterPassive::Civilian);
        players[0].passive.has_guaranteed_win = true;
        players[1].passive.has_guaranteed_win = true;
        let (out, notes) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, false), hand(Rps::Scissors, false)],
        );
        // Flags cancelled, the dice decide as usual.
        assert!(notes.contains(&DuelNote::GuaranteedWinsCancelled));
        assert_eq!(out.winner, Some(PlayerId(0)));
        assert!(!players[0].passive.has_guaranteed_win);
        assert!(!players[1].passive.has_guaranteed_win);
    }

    #[test]
    fn lone_guaranteed_win_overrides_the_dice() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Civilian, CharacterPassive::Civilian);
        players[1].passive.has_guaranteed_win = true;
        let (out, _) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, true), hand(Rps::Scissors, false)],
        );
        assert_eq!(out, DuelOutcome::win(PlayerId(1), false));
    }

    #[test]
    fn pacifist_forfeits_a_matching_sign_win() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Pacifist, CharacterPassive::Civilian);
        let (out, notes) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Paper, true), hand(Rps::Paper, false)],
        );
        assert!(out.is_tie());
        assert_eq!(
            notes,
            vec![DuelNote::PacifistStandDown { player: PlayerId(0) }]
        );
    }

    #[test]
    fn pacifist_does_not_touch_differing_signs() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Pacifist, CharacterPassive::Civilian);
        let (out, _) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, false), hand(Rps::Scissors, false)],
        );
        assert_eq!(out.winner, Some(PlayerId(0)));
    }

    #[test]
    fn overwhelming_power_breaks_double_specials() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Civilian, CharacterPassive::Civilian);
        players[1].passive.has_overwhelming_power = true;
        let (out, notes) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, true), hand(Rps::Rock, true)],
        );
        assert_eq!(out, DuelOutcome::win(PlayerId(1), true));
        assert!(notes.contains(&DuelNote::OverwhelmingPower { player: PlayerId(1) }));
        assert!(!players[1].passive.has_overwhelming_power);
    }

    #[test]
    fn negotiator_converts_ties_and_banks_tokens() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Negotiator, CharacterPassive::Civilian);
        let (out, _) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, false), hand(Rps::Rock, false)],
        );
        assert_eq!(out, DuelOutcome::win(PlayerId(0), false));
        assert_eq!(players[0].passive.negotiator_tokens, 1);
    }

    #[test]
    fn negotiator_token_downgrades_enemy_special_win() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Negotiator, CharacterPassive::Civilian);
        players[0].passive.negotiator_tokens = 1;
        let (out, notes) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Scissors, false), hand(Rps::Rock, true)],
        );
        assert_eq!(out, DuelOutcome::win(PlayerId(1), false));
        assert!(notes.contains(&DuelNote::SpecialDowngraded { by: PlayerId(0) }));
        assert_eq!(players[0].passive.negotiator_tokens, 0);
    }

    #[test]
    fn misfortune_loses_ties_unless_both_are_cursed() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Civilian, CharacterPassive::Civilian);
        players[0].passive.add_curse(CurseType::Misfortune);
        let (out, notes) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Paper, false), hand(Rps::Paper, false)],
        );
        assert_eq!(out, DuelOutcome::win(PlayerId(1), false));
        assert!(notes.contains(&DuelNote::MisfortuneLoss { player: PlayerId(0) }));

        players[1].passive.add_curse(CurseType::Misfortune);
        let (out, _) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Paper, false), hand(Rps::Paper, false)],
        );
        assert!(out.is_tie());
    }

    #[test]
    fn negotiator_is_immune_to_misfortune() {
        let rules = load_rules(RulesSource::Embedded).unwrap();
        let mut players = pair(&rules, CharacterPassive::Negotiator, CharacterPassive::Civilian);
        players[0].passive.add_curse(CurseType::Misfortune);
        let (out, _) = resolve(
            &rules,
            &mut players,
            [hand(Rps::Rock, false), hand(Rps::Rock, false)],
        );
        // The tie became a negotiator win before misfortune could see it.
        assert_eq!(out.winner, Some(PlayerId(0)));
    }
}
