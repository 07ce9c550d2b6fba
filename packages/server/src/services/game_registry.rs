use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::models::{
    config::GameConfig,
    event_bus::{EventBus, SlowSubscriberPolicy, DEFAULT_CAPACITY},
    game::Game,
};
use crate::utils::random::{generate_game_id, RandomSource};

const MAX_ID_ATTEMPTS: usize = 16;

/// ゲームID → ゲーム の対応表。別々のゲーム間の調整だけを担い、
/// 1つのゲーム内の整合性はゲーム自身のロックが守る
#[derive(Clone)]
pub struct GameRegistry {
    games: Arc<RwLock<HashMap<String, Arc<Game>>>>,
    observer_capacity: usize,
    observer_policy: SlowSubscriberPolicy,
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, SlowSubscriberPolicy::default())
    }
}

impl GameRegistry {
    pub fn new(observer_capacity: usize, observer_policy: SlowSubscriberPolicy) -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            observer_capacity,
            observer_policy,
        }
    }

    /// 未使用のIDでゲームを作成して登録する
    pub async fn create(
        &self,
        config: GameConfig,
        mut rng: Box<dyn RandomSource>,
    ) -> Result<Arc<Game>, ServiceError> {
        let mut games = self.games.write().await;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_game_id(rng.as_mut());
            if let Entry::Vacant(entry) = games.entry(id.clone()) {
                let observers = EventBus::new(self.observer_capacity, self.observer_policy);
                let game = Arc::new(Game::with_observers(id, config, rng, observers));
                entry.insert(game.clone());
                return Ok(game);
            }
        }

        Err(ServiceError::GameIdExhausted)
    }

    pub async fn store(&self, game: Arc<Game>) {
        self.games
            .write()
            .await
            .insert(game.id().to_string(), game);
    }

    pub async fn load(&self, game_id: &str) -> Result<Arc<Game>, ServiceError> {
        self.games
            .read()
            .await
            .get(game_id)
            .cloned()
            .ok_or_else(|| ServiceError::GameNotFound(game_id.to_string()))
    }

    pub async fn delete(&self, game_id: &str) -> Option<Arc<Game>> {
        self.games.write().await.remove(game_id)
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }
}
