use std::fmt;

/// クライアントエラー
///
/// すべてのエラーは呼び出し元に同期的に返される。内部でのリトライは行わない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// トランスポートの接続に失敗した
    ConnectionFailed,
    /// 呼び出し順序が不正
    ApiMisuse(&'static str),
    /// タイムアウト時間内にデータが届かなかった
    TimedOut,
    /// ステータスラインが期待する形式と一致しない
    InvalidResponse,
    /// begin_message() 前に end_message() が呼ばれた
    MessageNotStarted,
    /// begin_message() が二重に呼ばれた
    MessageAlreadyStarted,
    /// WebSocket ハンドシェイクで 101 以外のステータスを受信した
    UnexpectedStatus(u16),
    /// ヘッダー行が長すぎる
    HeaderLineTooLong { size: usize, limit: usize },
    /// ボディサイズ超過
    BodyTooLarge { size: u64, limit: u64 },
    /// トランスポートへの書き込みに失敗した
    Io(std::io::ErrorKind),
}

impl Error {
    /// 数値エラーコード (すべて負の値)
    pub fn code(&self) -> i32 {
        match self {
            Error::ConnectionFailed => -1,
            Error::ApiMisuse(_) => -2,
            Error::TimedOut => -3,
            Error::InvalidResponse => -4,
            Error::MessageNotStarted => -5,
            Error::MessageAlreadyStarted => -6,
            Error::UnexpectedStatus(_) => -7,
            Error::HeaderLineTooLong { .. } => -8,
            Error::BodyTooLarge { .. } => -9,
            Error::Io(_) => -10,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionFailed => write!(f, "connection failed"),
            Error::ApiMisuse(msg) => write!(f, "API misuse: {}", msg),
            Error::TimedOut => write!(f, "timed out waiting for response data"),
            Error::InvalidResponse => write!(f, "invalid response status line"),
            Error::MessageNotStarted => write!(f, "WebSocket message not started"),
            Error::MessageAlreadyStarted => write!(f, "WebSocket message already started"),
            Error::UnexpectedStatus(status_code) => {
                write!(f, "unexpected status code: {}", status_code)
            }
            Error::HeaderLineTooLong { size, limit } => {
                write!(f, "header line too long: {} > {}", size, limit)
            }
            Error::BodyTooLarge { size, limit } => {
                write!(f, "body too large: {} > {}", size, limit)
            }
            Error::Io(kind) => write!(f, "I/O error: {}", kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.kind())
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
