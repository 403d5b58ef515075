//! HTTP/1.x レスポンスパーサー (Sans I/O)
//!
//! 1 バイトずつ状態機械を進める。I/O とタイムアウトは呼び出し側
//! ([`HttpClient`](crate::HttpClient)) が担当する。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_http11_client::{ParserState, ResponseParser, StatusLine};
//!
//! let mut parser = ResponseParser::new();
//! parser.begin_request();
//! parser.mark_request_sent();
//! parser.begin_status_line().unwrap();
//!
//! let mut status = StatusLine::Pending;
//! for &c in b"HTTP/1.1 200 OK\r\n" {
//!     status = parser.push_status_byte(c).unwrap();
//! }
//! assert_eq!(status, StatusLine::Complete(200));
//!
//! for &c in b"Content-Length: 5\r\n\r\n" {
//!     parser.push_header_byte(c);
//! }
//! assert_eq!(parser.state(), ParserState::ReadingBody);
//! assert_eq!(parser.content_length(), Some(5));
//! ```

mod prefix;
mod state;

pub use state::ParserState;

use crate::error::{Error, Result};
use prefix::{PrefixMatch, PrefixMatcher};

const STATUS_PREFIX: &[u8] = b"HTTP/*.* ";
const CONTENT_LENGTH_PREFIX: &[u8] = b"Content-Length: ";
const TRANSFER_ENCODING_CHUNKED: &[u8] = b"Transfer-Encoding: chunked";

/// ステータスコードの最大桁数
const MAX_STATUS_DIGITS: u8 = 3;

/// ステータスライン 1 バイト分の処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    /// 行の途中
    Pending,
    /// 1xx レスポンスを読み飛ばした。次のステータスラインを待つ
    Informational(u16),
    /// 最終ステータスコード
    Complete(u16),
}

/// チャンクサイズ行の読み取り状態
#[derive(Debug, Clone, Copy, Default)]
struct ChunkSizeLine {
    digits_seen: bool,
    /// 16 進数以外の文字 (チャンク拡張など) 以降は無視する
    ignore_rest: bool,
}

/// HTTP レスポンスパーサー
#[derive(Debug, Clone)]
pub struct ResponseParser {
    state: ParserState,
    status_code: u16,
    status_digits: u8,
    status_prefix: PrefixMatcher,
    content_length: Option<u64>,
    body_consumed: u64,
    content_length_prefix: PrefixMatcher,
    chunked_prefix: PrefixMatcher,
    is_chunked: bool,
    chunk_remaining: u64,
    chunk_line: ChunkSizeLine,
    /// サイズ 0 のチャンクを受信した
    chunked_body_complete: bool,
    /// 読み飛ばした 1xx レスポンスのヘッダーを読み捨て中
    skipping_informational: bool,
    /// 読み捨て中の行がまだ空
    informational_line_empty: bool,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    /// 新しいパーサーを作成
    pub fn new() -> Self {
        Self {
            state: ParserState::Idle,
            status_code: 0,
            status_digits: 0,
            status_prefix: PrefixMatcher::with_wildcard(STATUS_PREFIX, b'*'),
            content_length: None,
            body_consumed: 0,
            content_length_prefix: PrefixMatcher::new(CONTENT_LENGTH_PREFIX),
            chunked_prefix: PrefixMatcher::new(TRANSFER_ENCODING_CHUNKED),
            is_chunked: false,
            chunk_remaining: 0,
            chunk_line: ChunkSizeLine::default(),
            chunked_body_complete: false,
            skipping_informational: false,
            informational_line_empty: false,
        }
    }

    /// 初期状態に戻す
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 現在の状態
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// ステータスコード (ステータスラインを読み終えるまでは `None`)
    pub fn status_code(&self) -> Option<u16> {
        (self.state >= ParserState::StatusCodeRead).then_some(self.status_code)
    }

    /// Content-Length ヘッダーの値 (未受信なら `None`)
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Content-Length 受信後に読み取ったボディのバイト数
    pub fn body_consumed(&self) -> u64 {
        self.body_consumed
    }

    /// Transfer-Encoding: chunked を受信したかどうか
    pub fn is_chunked(&self) -> bool {
        self.is_chunked
    }

    /// 現在のチャンクの残りバイト数
    pub fn chunk_remaining(&self) -> u64 {
        self.chunk_remaining
    }

    /// リクエストを開始できる状態かどうか
    pub fn can_start_request(&self) -> bool {
        matches!(self.state, ParserState::Idle | ParserState::RequestStarted)
    }

    /// 複数ステップのリクエストを開始
    pub fn begin_request(&mut self) {
        self.state = ParserState::RequestStarted;
    }

    /// リクエストヘッダーの送信完了
    pub fn mark_request_sent(&mut self) {
        self.state = ParserState::RequestSent;
    }

    /// ヘッダーをすべて読み終えたかどうか
    pub fn end_of_headers_reached(&self) -> bool {
        self.state.is_body()
    }

    /// ボディの終端に達したかどうか
    ///
    /// chunked の場合はサイズ 0 のチャンクを受信したとき、
    /// Content-Length の場合は宣言されたバイト数を読み終えたときに true になる。
    /// どちらでもない場合は終端を判断できないので常に false。
    pub fn end_of_body_reached(&self) -> bool {
        if !self.end_of_headers_reached() {
            return false;
        }
        if self.is_chunked {
            return self.chunked_body_complete;
        }
        match self.content_length {
            Some(len) => self.body_consumed >= len,
            None => false,
        }
    }

    /// ステータスラインの読み取りを開始
    ///
    /// リクエスト送信前に呼ぶと [`Error::ApiMisuse`] を返す。
    pub fn begin_status_line(&mut self) -> Result<()> {
        if self.state < ParserState::RequestSent {
            return Err(Error::ApiMisuse("response read before the request was sent"));
        }
        self.state = ParserState::RequestSent;
        self.status_code = 0;
        self.status_digits = 0;
        self.status_prefix.reset();
        self.skipping_informational = false;
        Ok(())
    }

    /// ステータスラインを 1 バイト処理
    ///
    /// `"HTTP/" <任意> "." <任意> " "` に続く最大 3 桁の数字をステータスコードとして読み、
    /// 行末の LF までを消費する。理由句は検証しない。
    /// 101 以外の 1xx は読み飛ばし、次のステータスラインに備えて状態を戻す。
    /// 1xx レスポンスのヘッダーは空行まで読み捨てる。
    pub fn push_status_byte(&mut self, c: u8) -> Result<StatusLine> {
        if self.skipping_informational && self.state == ParserState::RequestSent {
            self.skip_informational_byte(c);
            return Ok(StatusLine::Pending);
        }

        match self.state {
            ParserState::RequestSent => match self.status_prefix.push(c) {
                PrefixMatch::Partial => {}
                PrefixMatch::Complete => self.state = ParserState::ReadingStatusCode,
                PrefixMatch::Mismatch => return Err(Error::InvalidResponse),
            },
            ParserState::ReadingStatusCode => {
                if c.is_ascii_digit() && self.status_digits < MAX_STATUS_DIGITS {
                    self.status_code = self.status_code * 10 + u16::from(c - b'0');
                    self.status_digits += 1;
                } else if self.status_digits == 0 {
                    return Err(Error::InvalidResponse);
                } else {
                    self.state = ParserState::StatusCodeRead;
                }
            }
            ParserState::StatusCodeRead => {}
            _ => return Err(Error::ApiMisuse("status line already read")),
        }

        if c != b'\n' {
            return Ok(StatusLine::Pending);
        }
        if self.state != ParserState::StatusCodeRead {
            return Err(Error::InvalidResponse);
        }

        let status_code = self.status_code;
        if is_informational(status_code) {
            self.begin_status_line()?;
            self.skipping_informational = true;
            self.informational_line_empty = true;
            return Ok(StatusLine::Informational(status_code));
        }

        self.begin_header_line();
        Ok(StatusLine::Complete(status_code))
    }

    /// ヘッダーを 1 バイト処理
    ///
    /// "Content-Length: " と "Transfer-Encoding: chunked" の 2 つのプレフィックスと同時に照合し、
    /// どちらとも一致しなくなった行は残りを読み飛ばす。行頭の CRLF でヘッダー終端とする。
    /// ヘッダー終端後に呼んでも何もしない。
    pub fn push_header_byte(&mut self, c: u8) {
        if self.end_of_headers_reached() || self.state < ParserState::StatusCodeRead {
            return;
        }

        match self.state {
            ParserState::StatusCodeRead => {
                let at_line_start =
                    self.content_length_prefix.at_start() && self.chunked_prefix.at_start();
                let content_length = self.content_length_prefix.push(c);
                let chunked = self.chunked_prefix.push(c);

                if content_length == PrefixMatch::Complete {
                    self.state = ParserState::ReadingContentLength;
                    // 重複した Content-Length は最後のものを採用する
                    self.content_length = Some(0);
                    self.body_consumed = 0;
                } else if chunked == PrefixMatch::Complete {
                    self.is_chunked = true;
                    self.state = ParserState::SkipToEndOfHeader;
                } else if content_length == PrefixMatch::Partial
                    || chunked == PrefixMatch::Partial
                {
                    // 照合中
                } else if at_line_start && c == b'\r' {
                    self.state = ParserState::LineStartingCRFound;
                } else if at_line_start && c == b'\n' {
                    self.finish_headers();
                } else {
                    self.state = ParserState::SkipToEndOfHeader;
                }
            }
            ParserState::ReadingContentLength => {
                if c.is_ascii_digit() {
                    let len = self.content_length.unwrap_or(0);
                    self.content_length = Some(
                        len.saturating_mul(10)
                            .saturating_add(u64::from(c - b'0')),
                    );
                } else {
                    self.state = ParserState::SkipToEndOfHeader;
                }
            }
            ParserState::LineStartingCRFound => {
                if c == b'\n' {
                    self.finish_headers();
                }
            }
            _ => {}
        }

        if c == b'\n' && !self.end_of_headers_reached() {
            self.begin_header_line();
        }
    }

    /// チャンクサイズ行の読み取り待ちかどうか
    pub fn awaiting_chunk_size(&self) -> bool {
        self.state == ParserState::ReadingChunkLength && !self.chunked_body_complete
    }

    /// チャンクサイズ行を 1 バイト処理
    ///
    /// 16 進数を読み取り、LF でチャンクデータの読み取りへ遷移する。
    /// 数字を含まない行 (チャンクデータ直後の CRLF) は読み飛ばす。
    /// サイズ 0 のチャンクでボディ終端とする。トレーラーは処理しない。
    pub fn push_chunk_size_byte(&mut self, c: u8) {
        if !self.awaiting_chunk_size() {
            return;
        }

        match c {
            b'\n' => {
                if !self.chunk_line.digits_seen {
                    self.chunk_line = ChunkSizeLine::default();
                    return;
                }
                self.chunk_line = ChunkSizeLine::default();
                if self.chunk_remaining == 0 {
                    self.chunked_body_complete = true;
                } else {
                    self.state = ParserState::ReadingBodyChunk;
                }
            }
            b'\r' => {}
            _ if self.chunk_line.ignore_rest => {}
            _ => match (c as char).to_digit(16) {
                Some(digit) => {
                    self.chunk_remaining = self
                        .chunk_remaining
                        .saturating_mul(16)
                        .saturating_add(u64::from(digit));
                    self.chunk_line.digits_seen = true;
                }
                None => self.chunk_line.ignore_rest = true,
            },
        }
    }

    /// 境界をまたがずに読み取れるボディのバイト数
    ///
    /// `transport_available` はトランスポートがすぐに返せるバイト数。
    pub fn body_available(&self, transport_available: usize) -> usize {
        match self.state {
            ParserState::ReadingChunkLength => 0,
            ParserState::ReadingBodyChunk => {
                let remaining = usize::try_from(self.chunk_remaining).unwrap_or(usize::MAX);
                transport_available.min(remaining)
            }
            _ => transport_available,
        }
    }

    /// ボディを `n` バイト読み取ったことを記録
    pub fn on_body_read(&mut self, n: usize) {
        if n == 0 || !self.end_of_headers_reached() {
            return;
        }
        let n = n as u64;

        if self.content_length.is_some_and(|len| len > 0) {
            self.body_consumed = self.body_consumed.saturating_add(n);
        }

        if self.state == ParserState::ReadingBodyChunk {
            self.chunk_remaining = self.chunk_remaining.saturating_sub(n);
            if self.chunk_remaining == 0 {
                self.state = ParserState::ReadingChunkLength;
                self.chunk_line = ChunkSizeLine::default();
            }
        }
    }

    fn skip_informational_byte(&mut self, c: u8) {
        match c {
            b'\r' => {}
            b'\n' => {
                if self.informational_line_empty {
                    self.skipping_informational = false;
                }
                self.informational_line_empty = true;
            }
            _ => self.informational_line_empty = false,
        }
    }

    fn begin_header_line(&mut self) {
        self.state = ParserState::StatusCodeRead;
        self.content_length_prefix.reset();
        self.chunked_prefix.reset();
    }

    fn finish_headers(&mut self) {
        if self.is_chunked {
            self.state = ParserState::ReadingChunkLength;
            self.chunk_remaining = 0;
            self.chunk_line = ChunkSizeLine::default();
        } else {
            self.state = ParserState::ReadingBody;
        }
    }
}

/// 読み飛ばす 1xx レスポンスかどうか (101 はアップグレード成功なので最終レスポンス)
fn is_informational(status_code: u16) -> bool {
    (100..200).contains(&status_code) && status_code != 101
}
