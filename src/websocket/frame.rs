//! WebSocket フレームのエンコードとデコード (Sans I/O)
//!
//! ```text
//! byte0 = FIN(1) | RSV(3) | opcode(4)
//! byte1 = MASK(1) | len7(7)
//! len7 == 126: 16 ビット拡張長 (ビッグエンディアン)
//! len7 == 127: 64 ビット拡張長 (ビッグエンディアン)
//! MASK: 4 バイトのマスクキー
//! ```

/// FIN ビット
pub const FIN_BIT: u8 = 0x80;

/// MASK ビット
pub const MASK_BIT: u8 = 0x80;

/// フレームヘッダーの最大長 (2 + 8 + 4)
pub const MAX_FRAME_HEADER_LEN: usize = 14;

/// 16 ビット拡張長を示す len7
const EXTENDED_LEN_16: u8 = 126;

/// 64 ビット拡張長を示す len7
const EXTENDED_LEN_64: u8 = 127;

/// WebSocket オペコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// 継続フレーム (0x0)
    Continuation,
    /// テキスト (0x1)
    Text,
    /// バイナリ (0x2)
    Binary,
    /// クローズ (0x8)
    Close,
    /// Ping (0x9)
    Ping,
    /// Pong (0xA)
    Pong,
}

impl Opcode {
    /// 下位 4 ビットからオペコードを取得 (未定義の値は `None`)
    pub fn from_u8(value: u8) -> Option<Self> {
        match value & 0x0F {
            0x0 => Some(Self::Continuation),
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }

    /// オペコードの値
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }

    /// 制御フレームかどうか
    pub fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

/// エンコード済みフレームヘッダー
#[derive(Debug, Clone, Copy)]
pub struct FrameHeaderBytes {
    buf: [u8; MAX_FRAME_HEADER_LEN],
    len: usize,
}

impl FrameHeaderBytes {
    /// ヘッダーのバイト列
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// フレームヘッダーをエンコード
///
/// ペイロード長は 126 未満なら len7 にそのまま、65536 未満なら 16 ビット、
/// それ以上は 64 ビットの拡張長で表す。`mask_key` を指定すると MASK ビットを立てる。
pub fn encode_frame_header(
    fin: bool,
    opcode: Opcode,
    payload_len: u64,
    mask_key: Option<[u8; 4]>,
) -> FrameHeaderBytes {
    let mut buf = [0u8; MAX_FRAME_HEADER_LEN];
    let mask_bit = if mask_key.is_some() { MASK_BIT } else { 0 };

    buf[0] = if fin { FIN_BIT } else { 0 } | opcode.as_u8();
    let mut len = 2;
    if payload_len < u64::from(EXTENDED_LEN_16) {
        buf[1] = mask_bit | payload_len as u8;
    } else if payload_len <= u64::from(u16::MAX) {
        buf[1] = mask_bit | EXTENDED_LEN_16;
        buf[2..4].copy_from_slice(&(payload_len as u16).to_be_bytes());
        len = 4;
    } else {
        buf[1] = mask_bit | EXTENDED_LEN_64;
        buf[2..10].copy_from_slice(&payload_len.to_be_bytes());
        len = 10;
    }

    if let Some(key) = mask_key {
        buf[len..len + 4].copy_from_slice(&key);
        len += 4;
    }

    FrameHeaderBytes { buf, len }
}

/// デコード済みフレームヘッダー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// FIN ビット
    pub fin: bool,
    /// オペコードの生の値 (下位 4 ビット)
    pub opcode: u8,
    /// マスクされているかどうか
    pub masked: bool,
    /// ペイロード長
    pub payload_len: u64,
    /// マスクキー
    pub mask_key: [u8; 4],
    /// ヘッダー全体の長さ
    pub header_len: usize,
}

impl FrameHeader {
    /// 2 バイト目から、先頭 2 バイトに続くヘッダーのバイト数を求める
    pub fn remaining_header_len(second_byte: u8) -> usize {
        let extended = match second_byte & 0x7F {
            EXTENDED_LEN_16 => 2,
            EXTENDED_LEN_64 => 8,
            _ => 0,
        };
        let mask = if second_byte & MASK_BIT != 0 { 4 } else { 0 };
        extended + mask
    }

    /// フレームヘッダーをパース
    ///
    /// ヘッダー全体がそろっていなければ `None` を返す。
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let (&first, rest) = buf.split_first()?;
        let (&second, rest) = rest.split_first()?;
        let remaining = Self::remaining_header_len(second);
        if rest.len() < remaining {
            return None;
        }

        let masked = second & MASK_BIT != 0;
        let (payload_len, rest) = match second & 0x7F {
            EXTENDED_LEN_16 => (u64::from(u16::from_be_bytes([rest[0], rest[1]])), &rest[2..]),
            EXTENDED_LEN_64 => {
                let mut len = [0u8; 8];
                len.copy_from_slice(&rest[..8]);
                (u64::from_be_bytes(len), &rest[8..])
            }
            len7 => (u64::from(len7), rest),
        };

        let mut mask_key = [0u8; 4];
        if masked {
            mask_key.copy_from_slice(&rest[..4]);
        }

        Some(Self {
            fin: first & FIN_BIT != 0,
            opcode: first & 0x0F,
            masked,
            payload_len,
            mask_key,
            header_len: 2 + remaining,
        })
    }
}

/// マスクを適用 (マスク解除も同じ操作)
///
/// `offset` はペイロード先頭からの位置で、マスクキーの何バイト目から使うかを決める。
pub fn apply_mask(data: &mut [u8], key: [u8; 4], offset: usize) {
    for (i, b) in data.iter_mut().enumerate() {
        *b ^= key[(offset + i) % 4];
    }
}
