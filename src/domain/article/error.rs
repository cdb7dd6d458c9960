use super::model::ArticleField;
use crate::domain::session::{Action, Role};
use crate::types::InfraError;
use thiserror::Error;

/// 入力検証のエラー型
/// ネットワーク呼び出しの前に検出される
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 必須項目が空
    #[error("{field}が入力されていません")]
    MissingField { field: ArticleField },

    /// 12種類のカテゴリ以外が指定された
    #[error("不明なカテゴリです: {label}")]
    UnknownCategory { label: String },

    /// 利用者名が空
    #[error("利用者名が入力されていません")]
    EmptyUserName,

    /// ロールが不明
    #[error("不明なロールです: {value}（reader または publisher）")]
    UnknownRole { value: String },

    /// 検索項目が不明
    #[error("不明な検索項目です: {value}")]
    UnknownSearchField { value: String },
}

/// 記事操作のエラー型
#[derive(Error, Debug)]
pub enum ArticleError {
    /// 入力検証エラー
    #[error("入力エラー: {0}")]
    Validation(#[from] ValidationError),

    /// 同じIDの記事が既にキャッシュに存在する
    #[error("IDが既に存在します: {id}（別のIDを指定してください）")]
    DuplicateId { id: String },

    /// 最新の行一覧に対象記事が無い
    #[error("記事が見つかりません: {id}")]
    NotFound { id: String },

    /// 評価値が1〜5の範囲外
    #[error("評価は1〜5で指定してください: {value}")]
    InvalidRating { value: u8 },

    /// ロールに許可されていない操作
    #[error("権限がありません: {role}は{action}できません")]
    AccessDenied { role: Role, action: Action },

    /// シートAPIとの通信エラー
    #[error(transparent)]
    Store(#[from] InfraError),
}

impl ArticleError {
    pub fn not_found<I: Into<String>>(id: I) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn duplicate_id<I: Into<String>>(id: I) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// 通信を伴わずに検出されたエラーか
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateId { .. }
                | Self::InvalidRating { .. }
                | Self::AccessDenied { .. }
        )
    }
}

/// 記事操作のResult型エイリアス
pub type ArticleResult<T> = std::result::Result<T, ArticleError>;
