//! パーサー状態の定義

/// レスポンスパーサーの状態
///
/// 宣言順に大小関係を持つ。1 つのレスポンスの間は単調に進み、
/// 1xx レスポンスを読み飛ばすときだけ `RequestSent` へ戻る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParserState {
    /// 何もしていない
    Idle,
    /// リクエストライン送信済み (ヘッダー送信中)
    RequestStarted,
    /// リクエストヘッダー送信完了
    RequestSent,
    /// ステータスコード読み取り中
    ReadingStatusCode,
    /// ステータスコード読み取り完了 (以降はヘッダー行の先頭を表す)
    StatusCodeRead,
    /// Content-Length の値を読み取り中
    ReadingContentLength,
    /// ヘッダー行の残りを読み飛ばし中
    SkipToEndOfHeader,
    /// 行頭で CR を検出した
    LineStartingCRFound,
    /// ボディ読み取り中
    ReadingBody,
    /// チャンクサイズ行の読み取り中
    ReadingChunkLength,
    /// チャンクデータの読み取り中
    ReadingBodyChunk,
}

impl ParserState {
    /// ヘッダーをすべて読み終えたかどうか
    pub fn is_body(self) -> bool {
        matches!(
            self,
            ParserState::ReadingBody | ParserState::ReadingChunkLength | ParserState::ReadingBodyChunk
        )
    }
}
