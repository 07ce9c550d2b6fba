use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::RwLock;

use super::{
    config::GameConfig,
    event_bus::{EventBus, Subscription},
    player::{Player, PlayerId},
    role::{Role, Side},
    rule,
    state_change::StateChange,
};
use crate::error::GameError;
use crate::utils::random::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Start, // 参加者募集中
    Night, // 夜フェーズ
    Noon,  // 昼フェーズ（投票）
    End,   // ゲーム終了
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Start => write!(f, "開始前"),
            GamePhase::Night => write!(f, "夜"),
            GamePhase::Noon => write!(f, "昼"),
            GamePhase::End => write!(f, "終了"),
        }
    }
}

/// ある時点でのゲームのスナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub id: String,
    pub config: GameConfig,
    pub phase: GamePhase,
    pub day: u32,
    pub players: HashMap<PlayerId, Player>,
}

impl GameState {
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.is_alive()).count()
    }
}

/// 操作の結果として起きたフェーズ遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseOutcome {
    #[default]
    Unchanged,
    /// 全員揃って役職が配られ、初日の夜になった
    Started,
    /// 誰も死なずにフェーズが進んだ
    Advanced,
    Killed(PlayerId),
    GameOver(Side),
}

#[derive(Debug, Clone)]
pub struct ActionReport {
    pub state: GameState,
    pub old_phase: GamePhase,
    pub outcome: PhaseOutcome,
}

impl ActionReport {
    pub fn phase_changed(&self) -> bool {
        self.state.phase != self.old_phase
    }
}

/// 内部の進行段階。外からは GamePhase と日数として見える
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lobby,
    /// 初日の夜。襲撃は無く、全員の確認で昼になる
    FirstNight,
    Night { day: u32 },
    Noon { day: u32 },
    Over { day: u32 },
}

impl Stage {
    fn phase(self) -> GamePhase {
        match self {
            Stage::Lobby => GamePhase::Start,
            Stage::FirstNight | Stage::Night { .. } => GamePhase::Night,
            Stage::Noon { .. } => GamePhase::Noon,
            Stage::Over { .. } => GamePhase::End,
        }
    }

    fn day(self) -> u32 {
        match self {
            Stage::Lobby | Stage::FirstNight => 1,
            Stage::Night { day } | Stage::Noon { day } | Stage::Over { day } => day,
        }
    }
}

/// ロックで一括して守るゲームの可変状態
struct GameInner {
    stage: Stage,
    players: HashMap<PlayerId, Player>,
    join_order: Vec<PlayerId>,
    votes: HashMap<PlayerId, Option<PlayerId>>,
    acks: HashSet<PlayerId>,
    rng: Box<dyn RandomSource>,
}

impl GameInner {
    fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            stage: Stage::Lobby,
            players: HashMap::new(),
            join_order: Vec::new(),
            votes: HashMap::new(),
            acks: HashSet::new(),
            rng,
        }
    }

    fn phase(&self) -> GamePhase {
        self.stage.phase()
    }

    fn snapshot(&self, id: &str, config: GameConfig) -> GameState {
        GameState {
            id: id.to_string(),
            config,
            phase: self.stage.phase(),
            day: self.stage.day(),
            players: self.players.clone(),
        }
    }

    fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.is_alive()).count()
    }

    fn living_werewolves(&self) -> usize {
        self.players
            .values()
            .filter(|p| p.is_alive() && p.role == Role::Werewolf)
            .count()
    }

    fn roster_full(&self, config: &GameConfig) -> bool {
        self.players.len() == config.player_num()
    }

    fn all_acknowledged(&self, config: &GameConfig) -> bool {
        self.acks.len() == config.player_num()
    }

    fn werewolves_voted(&self) -> bool {
        self.votes.len() == self.living_werewolves()
    }

    fn everyone_voted(&self) -> bool {
        self.votes.len() == self.alive_count()
    }

    /// 遷移表。変更操作のたびにロック内で評価する
    fn advance(&mut self, config: &GameConfig) -> PhaseOutcome {
        match self.stage {
            Stage::Lobby if self.roster_full(config) => self.begin(config),
            Stage::FirstNight if self.all_acknowledged(config) => self.dawn(),
            Stage::Night { day } if self.werewolves_voted() && self.all_acknowledged(config) => {
                self.resolve_night(day)
            }
            Stage::Noon { day } if self.everyone_voted() && self.all_acknowledged(config) => {
                self.resolve_noon(day)
            }
            _ => PhaseOutcome::Unchanged,
        }
    }

    fn begin(&mut self, config: &GameConfig) -> PhaseOutcome {
        rule::assign_roles(
            &mut self.players,
            &self.join_order,
            config.werewolf_num(),
            self.rng.as_mut(),
        );
        self.clear_round();
        self.stage = Stage::FirstNight;
        PhaseOutcome::Started
    }

    fn dawn(&mut self) -> PhaseOutcome {
        self.clear_round();
        self.stage = Stage::Noon { day: 1 };
        PhaseOutcome::Advanced
    }

    fn resolve_night(&mut self, day: u32) -> PhaseOutcome {
        let leaders = rule::tally(self.votes.values());
        // 同票なら候補から抽選
        let target = match leaders.len() {
            0 => None,
            1 => leaders[0],
            n => leaders[self.rng.index(n)],
        };
        self.clear_round();

        let Some(target) = target else {
            self.stage = Stage::Noon { day };
            return PhaseOutcome::Advanced;
        };

        self.kill_player(target);
        match rule::judge(self.players.values()) {
            Side::Neutral => {
                self.stage = Stage::Noon { day };
                PhaseOutcome::Killed(target)
            }
            winner => {
                self.stage = Stage::Over { day };
                PhaseOutcome::GameOver(winner)
            }
        }
    }

    fn resolve_noon(&mut self, day: u32) -> PhaseOutcome {
        let leaders = rule::tally(self.votes.values());
        self.clear_round();

        // 同票・全員棄権なら処刑なし
        let [Some(target)] = leaders.as_slice() else {
            self.stage = Stage::Night { day: day + 1 };
            return PhaseOutcome::Advanced;
        };
        let target = *target;

        self.kill_player(target);
        match rule::judge(self.players.values()) {
            Side::Neutral => {
                self.stage = Stage::Night { day: day + 1 };
                PhaseOutcome::Killed(target)
            }
            winner => {
                self.stage = Stage::Over { day };
                PhaseOutcome::GameOver(winner)
            }
        }
    }

    fn kill_player(&mut self, player_id: PlayerId) {
        match self.players.get_mut(&player_id) {
            Some(player) => player.is_dead = true,
            None => error!("投票先のプレイヤー{}が存在しません", player_id),
        }
    }

    fn clear_round(&mut self) {
        self.votes.clear();
        self.acks.clear();
    }

    fn ensure_phase(&self, allowed: bool) -> Result<(), GameError> {
        if allowed {
            Ok(())
        } else {
            Err(GameError::InvalidPhase(self.phase()))
        }
    }

    fn player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))
    }

    fn living_actor(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        let player = self.player(player_id)?;
        if player.is_dead {
            return Err(GameError::DeadActorForbidden(player_id));
        }
        Ok(player)
    }

    fn living_target(&self, actor_id: PlayerId, target_id: PlayerId) -> Result<&Player, GameError> {
        if actor_id == target_id {
            return Err(GameError::SelfTargetForbidden(actor_id));
        }
        let target = self.player(target_id)?;
        if target.is_dead {
            return Err(GameError::DeadTargetForbidden(target_id));
        }
        Ok(target)
    }

    fn ensure_not_voted(&self, player_id: PlayerId) -> Result<(), GameError> {
        if self.votes.contains_key(&player_id) {
            return Err(GameError::AlreadyVoted(player_id));
        }
        Ok(())
    }
}

/// 1回分のプレイを表すゲーム。状態はすべて1つの読み書きロックの内側にあり、
/// 変更操作は検証・変更・遷移判定を排他ロックを保持したまま行う。
/// 通知の配送はロックの外で呼び出し側が行う
pub struct Game {
    id: String,
    config: GameConfig,
    inner: RwLock<GameInner>,
    observers: EventBus<StateChange>,
}

impl Game {
    pub fn new(id: String, config: GameConfig, rng: Box<dyn RandomSource>) -> Self {
        Self::with_observers(id, config, rng, EventBus::default())
    }

    pub fn with_observers(
        id: String,
        config: GameConfig,
        rng: Box<dyn RandomSource>,
        observers: EventBus<StateChange>,
    ) -> Self {
        Self {
            id,
            config,
            inner: RwLock::new(GameInner::new(rng)),
            observers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn mutate<F>(&self, action: F) -> Result<ActionReport, GameError>
    where
        F: FnOnce(&mut GameInner) -> Result<(), GameError>,
    {
        let mut inner = self.inner.write().await;
        let old_phase = inner.phase();

        action(&mut *inner)?;

        let outcome = inner.advance(&self.config);
        if outcome != PhaseOutcome::Unchanged {
            debug!(
                "game {}: {} -> {} (day {}), {:?}",
                self.id,
                old_phase,
                inner.phase(),
                inner.stage.day(),
                outcome
            );
        }

        Ok(ActionReport {
            state: inner.snapshot(&self.id, self.config),
            old_phase,
            outcome,
        })
    }

    pub async fn join(&self, player_id: PlayerId, name: String) -> Result<ActionReport, GameError> {
        self.mutate(move |inner| {
            inner.ensure_phase(inner.stage == Stage::Lobby)?;
            if inner.players.contains_key(&player_id) {
                return Err(GameError::AlreadyJoined(player_id));
            }
            inner.players.insert(player_id, Player::new(player_id, name));
            inner.join_order.push(player_id);
            Ok(())
        })
        .await
    }

    /// 開始前のみ。名簿から外れ、その席は再び空く
    pub async fn leave(&self, player_id: PlayerId) -> Result<ActionReport, GameError> {
        self.mutate(|inner| {
            inner.ensure_phase(inner.stage == Stage::Lobby)?;
            if inner.players.remove(&player_id).is_none() {
                return Err(GameError::NotJoined(player_id));
            }
            inner.join_order.retain(|id| *id != player_id);
            Ok(())
        })
        .await
    }

    /// 昼の投票。`None` は棄権
    pub async fn vote(
        &self,
        player_id: PlayerId,
        target_id: Option<PlayerId>,
    ) -> Result<ActionReport, GameError> {
        self.mutate(|inner| {
            inner.ensure_phase(matches!(inner.stage, Stage::Noon { .. }))?;
            inner.living_actor(player_id)?;
            if let Some(target_id) = target_id {
                inner.living_target(player_id, target_id)?;
            }
            inner.ensure_not_voted(player_id)?;

            inner.votes.insert(player_id, target_id);
            inner.acks.insert(player_id);
            Ok(())
        })
        .await
    }

    /// 2日目以降の夜の襲撃
    pub async fn kill(&self, player_id: PlayerId, target_id: PlayerId) -> Result<ActionReport, GameError> {
        self.mutate(|inner| {
            inner.ensure_phase(matches!(inner.stage, Stage::Night { .. }))?;
            if inner.living_actor(player_id)?.role != Role::Werewolf {
                return Err(GameError::NotWerewolf(player_id));
            }
            inner.living_target(player_id, target_id)?;
            inner.ensure_not_voted(player_id)?;

            inner.votes.insert(player_id, Some(target_id));
            inner.acks.insert(player_id);
            Ok(())
        })
        .await
    }

    pub async fn next(&self, player_id: PlayerId) -> Result<ActionReport, GameError> {
        self.mutate(|inner| {
            inner.ensure_phase(matches!(
                inner.stage,
                Stage::FirstNight | Stage::Night { .. } | Stage::Noon { .. }
            ))?;
            inner.player(player_id)?;
            if !inner.acks.insert(player_id) {
                return Err(GameError::AlreadyAcknowledged(player_id));
            }
            Ok(())
        })
        .await
    }

    /// 自分の役職を返す。人狼には仲間の人狼も含めて返す
    pub async fn get_roles(&self, player_id: PlayerId) -> Result<HashMap<PlayerId, Role>, GameError> {
        let inner = self.inner.read().await;
        inner.ensure_phase(inner.stage != Stage::Lobby)?;
        let player = inner.player(player_id)?;

        let mut roles = HashMap::from([(player.id, player.role)]);
        if player.role == Role::Werewolf {
            roles.extend(
                inner
                    .players
                    .values()
                    .filter(|p| p.role == Role::Werewolf)
                    .map(|p| (p.id, p.role)),
            );
        }
        Ok(roles)
    }

    pub async fn get_player(&self, player_id: PlayerId) -> Result<Player, GameError> {
        self.inner.read().await.player(player_id).cloned()
    }

    pub async fn snapshot(&self) -> GameState {
        self.inner.read().await.snapshot(&self.id, self.config)
    }

    pub async fn phase(&self) -> GamePhase {
        self.inner.read().await.phase()
    }

    pub async fn subscribe(&self, player_id: PlayerId) -> Subscription<StateChange> {
        self.observers.subscribe(player_id).await
    }

    pub async fn unsubscribe(&self, player_id: PlayerId) -> bool {
        self.observers.unsubscribe(player_id).await
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.subscriber_count().await
    }

    /// 現在の購読者全員に通知する
    pub async fn notify_state_changed(&self, change: StateChange) -> usize {
        self.observers.publish(change).await
    }

    /// 残っている購読をすべて閉じる
    pub async fn dispose(&self) {
        self.observers.close_all().await;
    }
}
