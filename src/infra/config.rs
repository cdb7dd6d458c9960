use crate::domain::article::ReconcilePolicy;
use crate::infra::storage::file::load_yaml_from_file;
use crate::types::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

/// 既定のシートAPIのコレクションURL
pub const DEFAULT_SHEET_URL: &str =
    "https://api.sheetbest.com/sheets/4b63fcc0-e8e8-4a03-8160-e59dd191375b";

/// アプリケーション設定
///
/// 読み込み順（後勝ち）: 既定値 → YAMLファイル → 環境変数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// シートAPIのコレクションURL
    pub sheet_url: String,
    /// 1リクエストあたりのタイムアウト（秒）
    pub request_timeout_secs: u64,
    /// 入稿後に再取得するまでの待ち時間（ミリ秒、0なら自動再取得しない）
    pub publish_reconcile_ms: u64,
    /// 編集・評価後に再取得するまでの待ち時間（ミリ秒、0なら自動再取得しない）
    pub update_reconcile_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            request_timeout_secs: 30,
            publish_reconcile_ms: 1000,
            update_reconcile_ms: 1500,
        }
    }
}

impl AppConfig {
    /// 設定を読み込む
    ///
    /// .envファイルがあれば環境変数に取り込んでから上書きを適用する。
    pub fn load(config_path: Option<&str>) -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();

        let base = match config_path {
            Some(path) => load_yaml_from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 環境変数（または任意の参照関数）による上書きを適用する
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SHEET_URL") {
            self.sheet_url = url.trim().to_string();
        }
        if let Some(value) = lookup("SHEET_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("SHEET_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("PUBLISH_RECONCILE_MS") {
            self.publish_reconcile_ms = parse_number("PUBLISH_RECONCILE_MS", &value)?;
        }
        if let Some(value) = lookup("UPDATE_RECONCILE_MS") {
            self.update_reconcile_ms = parse_number("UPDATE_RECONCILE_MS", &value)?;
        }
        Ok(self)
    }

    /// 設定値を検証する
    pub fn validate(&self) -> ConfigResult<()> {
        let url = Url::parse(&self.sheet_url).map_err(|e| {
            ConfigError::invalid_value("sheet_url", &self.sheet_url, e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid_value(
                "sheet_url",
                &self.sheet_url,
                "http または https のURLが必要です",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "request_timeout_secs",
                "0",
                "1以上を指定してください",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 書き込み後の再取得方針
    ///
    /// 0の項目はその書き込みでは自動再取得しない。両方0なら手動。
    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        if self.publish_reconcile_ms == 0 && self.update_reconcile_ms == 0 {
            return ReconcilePolicy::Manual;
        }
        ReconcilePolicy::After {
            publish: reconcile_delay(self.publish_reconcile_ms),
            update: reconcile_delay(self.update_reconcile_ms),
        }
    }
}

fn reconcile_delay(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn parse_number(name: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(name, value, "0以上の整数を指定してください"))
}
