use super::error::{ArticleError, ArticleResult};
use super::model::{Article, MAX_RATING};
use super::store::RemoteArticleStore;

/// 評価の書き込みを他の列を壊さずに行う
///
/// ストアは行全体の置換しか受け付けないため、書き込み直前に最新の行を読み、
/// 評価以外の列は読み取った値のまま書き戻す。
/// 読み取りと書き込みの間の競合は検出しない。
#[derive(Clone)]
pub struct RatingSynchronizer {
    store: RemoteArticleStore,
}

impl RatingSynchronizer {
    pub fn new(store: RemoteArticleStore) -> Self {
        Self { store }
    }

    /// 評価値が1〜5の範囲にあるか確認する
    pub fn check_value(value: u8) -> ArticleResult<()> {
        if (1..=MAX_RATING).contains(&value) {
            Ok(())
        } else {
            Err(ArticleError::InvalidRating { value })
        }
    }

    /// 評価を書き込み、ストアに書いた完全な行を返す
    ///
    /// 1. 全行を取得
    /// 2. `id`列が一致する行を探す（無ければ`NotFound`）
    /// 3. 評価だけを差し替えた完全な行を作る
    /// 4. 行を置換する
    pub async fn apply(&self, id: &str, value: u8) -> ArticleResult<Article> {
        Self::check_value(value)?;
        let id = id.trim();
        let updated = self
            .store
            .update_with(id, |current| current.with_rating(value))
            .await?;
        tracing::info!(id = %id, ratings = value, "評価を書き込みました");
        Ok(updated)
    }
}
