use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Arc;

/// 役職配布・同票時の抽選・ゲームID生成に使う乱数源。
/// テストでは決め打ちの値を注入して結果を固定する
pub trait RandomSource: Send + Sync {
    /// `0..len` の一様乱数。`len` は 1 以上
    fn index(&mut self, len: usize) -> usize;
}

/// ゲームごとに乱数源を作るファクトリ
pub type RandomFactory = Arc<dyn Fn() -> Box<dyn RandomSource> + Send + Sync>;

pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// 与えられた値を順に返す乱数源。値を使い切った後は 0 を返す
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    picks: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn index(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len
    }
}

pub fn std_random_factory() -> RandomFactory {
    Arc::new(|| Box::new(StdRandom::new()) as Box<dyn RandomSource>)
}

/// 毎回同じ値の列を返す乱数源を作るファクトリ（テスト用）
pub fn scripted_random_factory(picks: Vec<usize>) -> RandomFactory {
    Arc::new(move || Box::new(ScriptedRandom::new(picks.clone())) as Box<dyn RandomSource>)
}

/// 6桁の数字からなるゲームID
pub fn generate_game_id(rng: &mut dyn RandomSource) -> String {
    format!("{:06}", rng.index(1_000_000))
}
