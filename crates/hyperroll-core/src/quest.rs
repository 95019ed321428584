use hyperroll_protocol::{PlayerId, QuestKind, QuestReward};

/// A shared race: both players chase the same target and the first to reach
/// it takes the reward.
#[derive(Clone, Debug)]
pub struct Quest {
    pub kind: QuestKind,
    pub target: i64,
    pub reward: QuestReward,
    pub progress: [i64; 2],
}

/// What an `advance` call did to the log, one entry per touched quest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestUpdate {
    Progress {
        kind: QuestKind,
        player: PlayerId,
        progress: i64,
        target: i64,
    },
    Completed {
        kind: QuestKind,
        player: PlayerId,
        reward: QuestReward,
    },
}

/// The set of quests currently in play. At most one quest per kind; a
/// completed quest leaves the log.
#[derive(Clone, Debug, Default)]
pub struct QuestLog {
    quests: Vec<Quest>,
}

impl QuestLog {
    /// Open a quest. Returns false if one of this kind is already running.
    pub fn start(&mut self, kind: QuestKind, target: i64, reward: QuestReward) -> bool {
        if target <= 0 || self.quests.iter().any(|q| q.kind == kind) {
            return false;
        }
        self.quests.push(Quest {
            kind,
            target,
            reward,
            progress: [0, 0],
        });
        true
    }

    /// Credit `amount` toward `kind` for `player`.
    pub fn advance(&mut self, kind: QuestKind, player: PlayerId, amount: i64) -> Vec<QuestUpdate> {
        if amount <= 0 {
            return Vec::new();
        }
        let mut updates = Vec::new();
        self.quests.retain_mut(|quest| {
            if quest.kind != kind {
                return true;
            }
            quest.progress[player.index()] += amount;
            let progress = quest.progress[player.index()];
            if progress >= quest.target {
                updates.push(QuestUpdate::Completed {
                    kind: quest.kind,
                    player,
                    reward: quest.reward,
                });
                false
            } else {
                updates.push(QuestUpdate::Progress {
                    kind: quest.kind,
                    player,
                    progress,
                    target: quest.target,
                });
                true
            }
        });
        updates
    }

    pub fn active(&self) -> &[Quest] {
        &self.quests
    }
}
