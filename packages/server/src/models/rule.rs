use std::collections::HashMap;

use super::{
    player::{Player, PlayerId},
    role::{Role, Side},
};
use crate::utils::random::RandomSource;

/// 投票を対象ごとに集計し、最多得票の対象をすべて返す（昇順）。
/// `None` は棄権票。票が無ければ空
pub fn tally<'a, I>(votes: I) -> Vec<Option<PlayerId>>
where
    I: IntoIterator<Item = &'a Option<PlayerId>>,
{
    let mut counts: HashMap<Option<PlayerId>, usize> = HashMap::new();
    for target in votes {
        *counts.entry(*target).or_default() += 1;
    }

    let max = counts.values().copied().max().unwrap_or(0);
    let mut leaders: Vec<Option<PlayerId>> = counts
        .into_iter()
        .filter(|(_, count)| *count == max)
        .map(|(target, _)| target)
        .collect();
    leaders.sort_unstable();
    leaders
}

/// 勝敗判定。決着がついていなければ `Side::Neutral`
pub fn judge<'a, I>(players: I) -> Side
where
    I: IntoIterator<Item = &'a Player>,
{
    let (villagers, werewolves) = players
        .into_iter()
        .filter(|p| p.is_alive())
        .fold((0usize, 0usize), |(v, w), p| match p.side {
            Side::Villagers => (v + 1, w),
            Side::Werewolves => (v, w + 1),
            Side::Neutral => (v, w),
        });

    if werewolves == 0 {
        Side::Villagers
    } else if villagers <= werewolves {
        Side::Werewolves
    } else {
        Side::Neutral
    }
}

/// 役職配布。`join_order` の順に席番号を振り、候補から人狼を非復元抽出する。
/// 残りは全員村人
pub fn assign_roles(
    players: &mut HashMap<PlayerId, Player>,
    join_order: &[PlayerId],
    werewolf_num: usize,
    rng: &mut dyn RandomSource,
) {
    for (i, id) in join_order.iter().enumerate() {
        if let Some(player) = players.get_mut(id) {
            player.index = i + 1;
        }
    }

    let mut candidates = join_order.to_vec();
    for _ in 0..werewolf_num.min(candidates.len()) {
        let picked = candidates.remove(rng.index(candidates.len()));
        if let Some(player) = players.get_mut(&picked) {
            player.assign(Role::Werewolf);
        }
    }

    for id in candidates {
        if let Some(player) = players.get_mut(&id) {
            player.assign(Role::Villager);
        }
    }
}
