//! 単調増加クロック
//!
//! 受信待ちのポーリングで使用する。タイムアウトは最後にバイトを受信した時刻から計測する。

use std::cell::Cell;
use std::time::{Duration, Instant};

/// ミリ秒単位の単調増加クロックと待機
pub trait Clock {
    /// 現在時刻 (ミリ秒)
    fn now_millis(&self) -> u64;

    /// 指定時間待つ
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// std の Instant を使うクロック
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// 新しいクロックを作成
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// sleep() で仮想時刻を進めるクロック
///
/// 実時間を待たずにタイムアウトを検証するために使う。
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    sleeps: Cell<usize>,
}

impl ManualClock {
    /// 時刻 0 のクロックを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 時刻を進める
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_millis() as u64);
    }

    /// sleep() が呼ばれた回数
    pub fn sleeps(&self) -> usize {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}
