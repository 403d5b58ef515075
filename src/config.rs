use std::time::Duration;

/// デフォルトの User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("shiguredo_http11_client/", env!("CARGO_PKG_VERSION"));

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// 最後にバイトを受信してからタイムアウトするまでの時間 (デフォルト: 30 秒)
    pub response_timeout: Duration,
    /// データが届いていないときに待つ間隔 (デフォルト: 1000 ミリ秒)
    pub wait_for_data_delay: Duration,
    /// header_available() が保持するヘッダー行の最大長 (デフォルト: 256 バイト)
    pub max_header_line_size: usize,
    /// response_body() が読み取る最大ボディサイズ (デフォルト: 64KB)
    pub max_body_size: u64,
    /// User-Agent ヘッダーの値
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
            wait_for_data_delay: Duration::from_millis(1000),
            max_header_line_size: 256,
            max_body_size: 64 * 1024, // 64KB
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// タイムアウトを設定
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// 待機間隔を設定
    pub fn wait_for_data_delay(mut self, delay: Duration) -> Self {
        self.wait_for_data_delay = delay;
        self
    }

    /// User-Agent を設定
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}
