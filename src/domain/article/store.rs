use super::error::{ArticleError, ArticleResult};
use super::model::Article;
use crate::infra::api::http::{row_has_id, SheetClient};
use crate::types::InfraResult;
use std::sync::Arc;

/// シートAPIを記事単位で扱うための薄いCRUDファサード
///
/// 依存注入したクライアントを共有するため、cloneしても同じ接続先を指す。
#[derive(Clone)]
pub struct RemoteArticleStore {
    client: Arc<dyn SheetClient>,
}

impl RemoteArticleStore {
    pub fn new(client: Arc<dyn SheetClient>) -> Self {
        Self { client }
    }

    /// 全行を到着順で取得し、欠けた列を既定値で補った記事として返す
    pub async fn list_all(&self) -> InfraResult<Vec<Article>> {
        let rows = self.client.list_rows().await?;
        Ok(rows
            .iter()
            .enumerate()
            .map(|(index, row)| Article::from_row(row, index))
            .collect())
    }

    /// 全行を取得し、`id`列が一致する最初の行を返す
    ///
    /// `id`列を持たない行は一致しない。
    pub async fn find(&self, id: &str) -> InfraResult<Option<Article>> {
        let rows = self.client.list_rows().await?;
        Ok(rows
            .iter()
            .enumerate()
            .find(|(_, row)| row_has_id(row, id))
            .map(|(index, row)| Article::from_row(row, index)))
    }

    /// 行を追加する（ID重複はストア側では検査されない）
    pub async fn create(&self, article: &Article) -> InfraResult<()> {
        self.client.create_row(&article.to_row()).await
    }

    /// 行を丸ごと置き換える
    ///
    /// ストアは部分更新を受け付けず、送らなかった列は消える。
    /// 呼び出し側は必ず[`RemoteArticleStore::update_with`]で最新行と合成すること。
    pub async fn replace(&self, id: &str, article: &Article) -> InfraResult<()> {
        self.client.replace_row(id, &article.to_row()).await
    }

    /// 行を削除する（未知のIDはステータスエラーになる）
    pub async fn remove(&self, id: &str) -> InfraResult<()> {
        self.client.remove_row(id).await
    }

    /// 最新行を読み、`merge`で合成した完全な行を書き戻す
    ///
    /// 読み取りから書き込みまでの間に他端末が書いた変更は失われうる。
    pub async fn update_with<F>(&self, id: &str, merge: F) -> ArticleResult<Article>
    where
        F: FnOnce(&Article) -> Article,
    {
        let current = self
            .find(id)
            .await?
            .ok_or_else(|| ArticleError::not_found(id))?;
        let updated = merge(&current);
        self.replace(id, &updated).await?;
        Ok(updated)
    }
}
