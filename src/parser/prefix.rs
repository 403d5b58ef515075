//! 固定プレフィックスの 1 バイトずつの照合
//!
//! ヘッダー行をバッファリングせずに、既知のヘッダーを 1 バイトあたり O(1) で認識する。

/// 照合結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrefixMatch {
    /// ここまで一致
    Partial,
    /// プレフィックス全体が一致
    Complete,
    /// 不一致 (この行ではもう一致しない)
    Mismatch,
}

/// プレフィックス照合カーソル
#[derive(Debug, Clone)]
pub(crate) struct PrefixMatcher {
    pattern: &'static [u8],
    /// このバイトはどのバイトとも一致する
    wildcard: Option<u8>,
    matched: usize,
    failed: bool,
}

impl PrefixMatcher {
    pub(crate) const fn new(pattern: &'static [u8]) -> Self {
        Self {
            pattern,
            wildcard: None,
            matched: 0,
            failed: false,
        }
    }

    pub(crate) const fn with_wildcard(pattern: &'static [u8], wildcard: u8) -> Self {
        Self {
            pattern,
            wildcard: Some(wildcard),
            matched: 0,
            failed: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.matched = 0;
        self.failed = false;
    }

    /// まだ 1 バイトも照合していない
    pub(crate) fn at_start(&self) -> bool {
        self.matched == 0 && !self.failed
    }

    pub(crate) fn push(&mut self, c: u8) -> PrefixMatch {
        if self.failed || self.matched >= self.pattern.len() {
            self.failed = true;
            return PrefixMatch::Mismatch;
        }

        let expected = self.pattern[self.matched];
        if expected == c || Some(expected) == self.wildcard {
            self.matched += 1;
            if self.matched == self.pattern.len() {
                PrefixMatch::Complete
            } else {
                PrefixMatch::Partial
            }
        } else {
            self.failed = true;
            PrefixMatch::Mismatch
        }
    }
}
