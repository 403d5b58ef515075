//! PBT テスト共通ユーティリティ

use proptest::prelude::*;
use shiguredo_http11_client::MemoryTransport;

// ========================================
// 受信データの分割
// ========================================

/// 分割の指定 (セグメントの大きさとストールを挟むかどうか)
#[derive(Debug, Clone)]
pub struct Delivery {
    pub sizes: Vec<usize>,
    pub stalls: Vec<bool>,
}

/// 1..=16 バイトのセグメント列とストールの有無
pub fn delivery() -> impl Strategy<Value = Delivery> {
    (
        proptest::collection::vec(1usize..=16, 1..32),
        proptest::collection::vec(any::<bool>(), 1..32),
    )
        .prop_map(|(sizes, stalls)| Delivery { sizes, stalls })
}

/// `data` を `delivery` に従って分割してトランスポートに積む
///
/// サイズ列を使い切ったら先頭から繰り返す。
pub fn push_with_delivery(transport: &mut MemoryTransport, data: &[u8], delivery: &Delivery) {
    let mut rest = data;
    let mut i = 0;
    while !rest.is_empty() {
        let size = delivery.sizes[i % delivery.sizes.len()].min(rest.len());
        let (head, tail) = rest.split_at(size);
        transport.push(head);
        if delivery.stalls[i % delivery.stalls.len()] {
            transport.push_stall();
        }
        rest = tail;
        i += 1;
    }
}

// ========================================
// HTTP 生成
// ========================================

/// ヘッダー名 (Content-Length / Transfer-Encoding と無関係なもの)
pub fn header_name() -> impl Strategy<Value = String> {
    "X-[A-Za-z0-9-]{1,16}".prop_map(|s| s)
}

/// ヘッダー値 (CR/LF を含まない)
pub fn header_value() -> impl Strategy<Value = String> {
    "[ -~]{0,32}".prop_map(|s| s)
}

/// 追加のヘッダー
pub fn extra_headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..6)
}

/// 最終ステータスコード (1xx 以外)
pub fn final_status_code() -> impl Strategy<Value = u16> {
    200u16..=599
}

/// ボディ
pub fn body() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..512)
}

/// chunked エンコード
///
/// 空のチャンクは終端と区別できないので取り除く。
pub fn encode_chunked(chunks: &[Vec<u8>], uppercase: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks.iter().filter(|chunk| !chunk.is_empty()) {
        let size = if uppercase {
            format!("{:X}\r\n", chunk.len())
        } else {
            format!("{:x}\r\n", chunk.len())
        };
        out.extend_from_slice(size.as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}
