/// Toggl APIのデフォルトのエンドポイント。
pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";

/// Toggl APIと通信するための設定。
#[derive(Clone, Debug, PartialEq)]
pub struct TogglConfig {
    pub api_url: String,
    pub api_token: String,
}

impl TogglConfig {
    /// 新しい`TogglConfig`を返す。
    ///
    /// URL末尾の`/`は取り除く。
    pub fn new(api_url: &str, api_token: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }
}
