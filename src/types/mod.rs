//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定エラー: 環境変数や設定ファイルの読み込み失敗
//! - インフラエラー: シートAPIとのHTTP通信で発生する失敗

pub mod config;
pub mod infra;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult};
pub use infra::{InfraError, InfraResult};
