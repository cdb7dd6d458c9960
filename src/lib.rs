//! 記事の入稿・閲覧・評価を、表計算シートを裏に持つREST APIで同期するクライアント
//!
//! - `infra`: シートAPIクライアント、設定、ログ
//! - `domain`: 記事モデル、共有キャッシュ、評価の同期、ロール
//! - `app`: 画面操作に相当するコマンド

pub mod app;
pub mod domain;
pub mod infra;
pub mod types;
