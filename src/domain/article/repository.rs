use super::error::{ArticleError, ArticleResult};
use super::model::{require_id, Article, ArticleDraft, ArticleFields};
use super::rating::RatingSynchronizer;
use super::search::{search_articles, SearchField};
use super::store::RemoteArticleStore;
use crate::infra::api::http::SheetClient;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// 書き込み後の再取得（リコンサイル）の方針
///
/// ローカルの楽観的更新は次の再取得までの間だけ正とみなされ、
/// 再取得の結果で上書き（場合によっては巻き戻し）される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// 書き込み成功から一定時間後にバックグラウンドで再取得する
    ///
    /// 書き込みの種類ごとに指定し、`None`の種類は自動では再取得しない。
    After {
        publish: Option<Duration>,
        update: Option<Duration>,
    },
    /// 自動では再取得しない（呼び出し側が`refresh`する）
    Manual,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self::After {
            publish: Some(Duration::from_millis(1000)),
            update: Some(Duration::from_millis(1500)),
        }
    }
}

/// 記事ごとの操作状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    InFlight,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Publish,
    Update,
}

/// 全画面で共有する記事キャッシュ
///
/// cloneしたハンドルは同じキャッシュを指す（コピーではなく参照）。
/// キャッシュの並びは「最後に取得した一覧を逆順にしたもの」で、タイムスタンプ順ではない。
#[derive(Clone)]
pub struct ArticleRepository {
    store: RemoteArticleStore,
    ratings: RatingSynchronizer,
    cache: Arc<RwLock<Vec<Article>>>,
    states: Arc<Mutex<HashMap<String, OperationState>>>,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
    policy: ReconcilePolicy,
}

impl ArticleRepository {
    pub fn new(client: Arc<dyn SheetClient>, policy: ReconcilePolicy) -> Self {
        let store = RemoteArticleStore::new(client);
        Self {
            ratings: RatingSynchronizer::new(store.clone()),
            store,
            cache: Arc::new(RwLock::new(Vec::new())),
            states: Arc::new(Mutex::new(HashMap::new())),
            pending: Arc::new(Mutex::new(Vec::new())),
            policy,
        }
    }

    /// キャッシュのスナップショット
    pub async fn articles(&self) -> Vec<Article> {
        self.cache.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Article> {
        let id = id.trim();
        self.cache.read().await.iter().find(|a| a.id == id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.get(id).await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// キャッシュ上の評価
    pub async fn rating_of(&self, id: &str) -> Option<u8> {
        self.get(id).await.map(|a| a.ratings)
    }

    /// キャッシュを検索する（並びはキャッシュ順）
    pub async fn search(&self, query: &str, field: SearchField) -> Vec<Article> {
        let cache = self.cache.read().await;
        search_articles(&cache, query, field)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn operation_state(&self, id: &str) -> OperationState {
        self.states
            .lock()
            .await
            .get(id.trim())
            .copied()
            .unwrap_or(OperationState::Idle)
    }

    /// 全行を取得し、逆順にしてキャッシュを丸ごと置き換える
    ///
    /// 未確定の楽観的更新はここで上書きされうる。失敗時はキャッシュを変更しない。
    pub async fn refresh(&self) -> ArticleResult<usize> {
        let mut articles = self.store.list_all().await?;
        articles.reverse();
        let count = articles.len();
        *self.cache.write().await = articles;
        tracing::debug!(count, "記事キャッシュを更新しました");
        Ok(count)
    }

    /// 記事を入稿する
    ///
    /// 入力検証とID重複確認（キャッシュ上のみ）は通信の前に行う。
    /// 追加に成功したら未評価の記事をキャッシュの先頭に入れる。
    pub async fn publish(&self, draft: &ArticleDraft) -> ArticleResult<Article> {
        let draft = draft.validate()?;
        if self.contains(&draft.id).await {
            return Err(ArticleError::duplicate_id(draft.id));
        }
        let article = Article::from_draft(draft);

        self.tracked(&article.id, async {
            self.store.create(&article).await?;
            self.cache.write().await.insert(0, article.clone());
            Ok::<_, ArticleError>(())
        })
        .await?;

        tracing::info!(id = %article.id, category = %article.category, "記事を入稿しました");
        self.schedule_reconcile(WriteKind::Publish).await;
        Ok(article)
    }

    /// 記事を編集する
    ///
    /// 最新行を読んで評価を引き継ぎ、完全な行で置き換える。
    pub async fn edit(&self, id: &str, fields: &ArticleFields) -> ArticleResult<Article> {
        let id = require_id(id)?;
        let fields = fields.validate()?;

        let updated = self
            .tracked(id, async {
                let updated = self
                    .store
                    .update_with(id, |current| current.with_fields(&fields))
                    .await?;
                self.patch(id, &updated).await;
                Ok::<_, ArticleError>(updated)
            })
            .await?;

        tracing::info!(id = %id, "記事を更新しました");
        self.schedule_reconcile(WriteKind::Update).await;
        Ok(updated)
    }

    /// 記事を削除する（成功した時点でキャッシュからも除く）
    pub async fn delete(&self, id: &str) -> ArticleResult<()> {
        let id = require_id(id)?;
        self.tracked(id, async {
            self.store.remove(id).await?;
            self.cache.write().await.retain(|a| a.id != id);
            Ok::<_, ArticleError>(())
        })
        .await?;

        tracing::info!(id = %id, "記事を削除しました");
        Ok(())
    }

    /// 記事を評価する
    ///
    /// 書き込んだ行で該当エントリを丸ごと更新し、他の列も最新の値に揃える。
    pub async fn rate(&self, id: &str, value: u8) -> ArticleResult<Article> {
        let id = require_id(id)?;
        RatingSynchronizer::check_value(value)?;

        let updated = self
            .tracked(id, async {
                let updated = self.ratings.apply(id, value).await?;
                self.patch(id, &updated).await;
                Ok::<_, ArticleError>(updated)
            })
            .await?;

        self.schedule_reconcile(WriteKind::Update).await;
        Ok(updated)
    }

    /// スケジュール済みの再取得がすべて終わるまで待つ
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = self.pending.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "再取得タスクが異常終了しました");
            }
        }
    }

    /// キャッシュ中の同じIDのエントリを置き換える
    async fn patch(&self, id: &str, article: &Article) {
        let mut cache = self.cache.write().await;
        for entry in cache.iter_mut().filter(|a| a.id == id) {
            *entry = article.clone();
        }
    }

    /// 操作状態を InFlight → Applied / Failed と遷移させながら実行する
    async fn tracked<T, F>(&self, id: &str, operation: F) -> ArticleResult<T>
    where
        F: Future<Output = ArticleResult<T>>,
    {
        self.set_state(id, OperationState::InFlight).await;
        let result = operation.await;
        let state = match &result {
            Ok(_) => OperationState::Applied,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "記事の操作に失敗しました");
                OperationState::Failed
            }
        };
        self.set_state(id, state).await;
        result
    }

    async fn set_state(&self, id: &str, state: OperationState) {
        self.states.lock().await.insert(id.to_string(), state);
    }

    async fn schedule_reconcile(&self, kind: WriteKind) {
        let delay = match (self.policy, kind) {
            (ReconcilePolicy::Manual, _) => None,
            (ReconcilePolicy::After { publish, .. }, WriteKind::Publish) => publish,
            (ReconcilePolicy::After { update, .. }, WriteKind::Update) => update,
        };
        let Some(delay) = delay else {
            return;
        };

        let repository = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = repository.refresh().await {
                tracing::warn!(error = %e, "書き込み後の再取得に失敗しました");
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::error::ValidationError;
    use crate::domain::article::model::{ArticleField, DEFAULT_NAME};
    use crate::infra::api::http::{MockSheetClient, SheetOperation, SheetRow};
    use serde_json::{json, Value};

    fn rows(value: Value) -> Vec<SheetRow> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn seeded() -> (Arc<MockSheetClient>, ArticleRepository) {
        let mock = Arc::new(MockSheetClient::with_rows(rows(json!([
            {"id": "1", "name": "First", "author": "A", "date": "01/01/2024",
             "category": "Health", "content": "one", "ratings": "3"},
            {"id": "2", "name": "Second", "author": "B", "date": "02/01/2024",
             "category": "Food", "content": "two", "ratings": "0"}
        ]))));
        let repository = ArticleRepository::new(mock.clone(), ReconcilePolicy::Manual);
        (mock, repository)
    }

    fn draft(id: &str) -> ArticleDraft {
        ArticleDraft::new(id, "Test", "Alice", "Technology", "Body text").with_date("01/01/2024")
    }

    fn ids(articles: &[Article]) -> Vec<String> {
        articles.iter().map(|a| a.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_refresh_reverses_fetch_order() {
        let (_, repository) = seeded();
        let count = repository.refresh().await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(ids(&repository.articles().await), vec!["2", "1"]);
        assert_eq!(repository.rating_of("1").await, Some(3));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_cache() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();
        mock.fail_on(SheetOperation::List, 500);

        assert!(repository.refresh().await.is_err());
        assert_eq!(repository.len().await, 2);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let (_, repository) = seeded();
        let other_screen = repository.clone();

        repository.refresh().await.unwrap();
        assert_eq!(other_screen.len().await, 2);
    }

    #[tokio::test]
    async fn test_publish_prepends_zero_rated_article() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();

        let article = repository.publish(&draft(" 7 ")).await.unwrap();
        assert_eq!(article.id, "7");
        assert_eq!(article.ratings, 0);

        let cached = repository.articles().await;
        assert_eq!(cached[0], article);
        assert_eq!(mock.rows().len(), 3);
        assert_eq!(repository.operation_state("7").await, OperationState::Applied);
    }

    #[tokio::test]
    async fn test_publish_duplicate_id_is_rejected_before_network() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();
        let calls = mock.total_calls();

        let result = repository.publish(&draft("1")).await;
        assert!(matches!(result, Err(ArticleError::DuplicateId { .. })));
        assert_eq!(mock.total_calls(), calls);
    }

    #[tokio::test]
    async fn test_publish_rejected_by_store_leaves_cache() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();
        mock.fail_on(SheetOperation::Create, 400);

        let result = repository.publish(&draft("9")).await;
        assert!(result.is_err());
        assert!(!repository.contains("9").await);
        assert_eq!(repository.operation_state("9").await, OperationState::Failed);
    }

    #[tokio::test]
    async fn test_edit_with_empty_field_makes_no_calls() {
        let (mock, repository) = seeded();
        let fields = ArticleFields::new("Name", "", "Health", "Body");

        let result = repository.edit("1", &fields).await;
        assert!(matches!(result, Err(ArticleError::Validation(_))));
        assert_eq!(mock.total_calls(), 0);
        assert_eq!(repository.operation_state("1").await, OperationState::Idle);
    }

    #[tokio::test]
    async fn test_edit_keeps_remote_rating() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();

        let fields = ArticleFields::new("Renamed", "A", "Science", "new body").with_date("05/05/2024");
        let updated = repository.edit("1", &fields).await.unwrap();

        assert_eq!(updated.ratings, 3);
        assert_eq!(repository.get("1").await.unwrap().name, "Renamed");
        let row = mock.rows().into_iter().find(|r| r["id"] == "1").unwrap();
        assert_eq!(row["category"], "Science");
        assert_eq!(row["ratings"], json!(3));
    }

    #[tokio::test]
    async fn test_edit_missing_row() {
        let (mock, repository) = seeded();
        let fields = ArticleFields::new("N", "A", "Health", "B");

        let result = repository.edit("99", &fields).await;
        assert!(matches!(result, Err(ArticleError::NotFound { .. })));
        assert_eq!(mock.calls(SheetOperation::Replace), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_from_cache() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();

        repository.delete("2").await.unwrap();
        assert_eq!(ids(&repository.articles().await), vec!["1"]);
        assert_eq!(mock.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_cache() {
        let (_, repository) = seeded();
        repository.refresh().await.unwrap();

        let result = repository.delete("404").await;
        assert!(matches!(result, Err(ArticleError::Store(_))));
        assert_eq!(repository.len().await, 2);
    }

    #[tokio::test]
    async fn test_rate_patches_cache_with_authoritative_row() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();

        // 別端末が記事名を変更した
        mock.replace_row(
            "2",
            &rows(json!([{"id": "2", "name": "Changed elsewhere", "author": "B",
                "date": "02/01/2024", "category": "Food", "content": "two", "ratings": "0"}]))[0],
        )
        .await
        .unwrap();

        let updated = repository.rate("2", 5).await.unwrap();
        assert_eq!(updated.name, "Changed elsewhere");

        let cached = repository.get("2").await.unwrap();
        assert_eq!(cached.ratings, 5);
        assert_eq!(cached.name, "Changed elsewhere");
    }

    #[tokio::test]
    async fn test_rate_unknown_id_changes_nothing() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();
        let before_cache = repository.articles().await;
        let before_rows = mock.rows();

        let result = repository.rate("404", 4).await;
        assert!(matches!(result, Err(ArticleError::NotFound { .. })));
        assert_eq!(repository.articles().await, before_cache);
        assert_eq!(mock.rows(), before_rows);
        assert_eq!(repository.operation_state("404").await, OperationState::Failed);
    }

    #[tokio::test]
    async fn test_rate_replace_failure_keeps_cache() {
        let (mock, repository) = seeded();
        repository.refresh().await.unwrap();
        mock.fail_on(SheetOperation::Replace, 500);

        assert!(repository.rate("1", 1).await.is_err());
        assert_eq!(repository.rating_of("1").await, Some(3));
    }

    #[tokio::test]
    async fn test_index_id_collision_affects_every_matching_entry() {
        // 2行目はid列が無いので位置「1」がIDになり、1行目と重なる
        let mock = Arc::new(MockSheetClient::with_rows(rows(json!([
            {"id": "1", "name": "Real"},
            {"name": "No id column"}
        ]))));
        let repository = ArticleRepository::new(mock.clone(), ReconcilePolicy::Manual);
        repository.refresh().await.unwrap();
        assert_eq!(ids(&repository.articles().await), vec!["1", "1"]);

        repository.delete("1").await.unwrap();
        assert!(repository.is_empty().await);
        // シート側はid列を持つ行だけが消える
        assert_eq!(mock.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_search_through_repository() {
        let (_, repository) = seeded();
        repository.refresh().await.unwrap();

        let found = repository.search("sec", SearchField::Name).await;
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[tokio::test]
    async fn test_delayed_reconcile_replaces_optimistic_state() {
        let mock = Arc::new(MockSheetClient::new());
        let repository = ArticleRepository::new(
            mock.clone(),
            ReconcilePolicy::After {
                publish: Some(Duration::from_millis(10)),
                update: Some(Duration::from_millis(10)),
            },
        );

        repository.publish(&draft("7")).await.unwrap();
        // 別端末の入稿は次の再取得で見えるようになる
        mock.put_row_directly(rows(json!([{"id": "8"}]))[0].clone());

        repository.settle().await;
        let cached = repository.articles().await;
        assert_eq!(ids(&cached), vec!["8", "7"]);
        assert_eq!(cached[0].name, DEFAULT_NAME);
    }

    #[tokio::test]
    async fn test_reconcile_only_for_configured_write_kind() {
        let (mock, repository) = seeded();
        let repository = ArticleRepository {
            policy: ReconcilePolicy::After {
                publish: None,
                update: Some(Duration::from_millis(10)),
            },
            ..repository
        };

        repository.publish(&draft("7")).await.unwrap();
        repository.settle().await;
        assert_eq!(mock.calls(SheetOperation::List), 0);

        repository.rate("7", 2).await.unwrap();
        let lists_after_rate = mock.calls(SheetOperation::List);
        repository.settle().await;
        assert_eq!(mock.calls(SheetOperation::List), lists_after_rate + 1);
        assert_eq!(repository.len().await, 3);
    }

    #[tokio::test]
    async fn test_blank_id_is_rejected_before_network() {
        let (mock, repository) = seeded();
        let missing_id = |result: &ArticleResult<_>| {
            matches!(
                result,
                Err(ArticleError::Validation(ValidationError::MissingField {
                    field: ArticleField::Id
                }))
            )
        };

        assert!(missing_id(&repository.delete("   ").await.map(|_| ())));
        assert!(missing_id(&repository.rate("", 3).await.map(|_| ())));
        let fields = ArticleFields::new("N", "A", "Health", "B");
        assert!(missing_id(&repository.edit(" \t", &fields).await.map(|_| ())));

        assert_eq!(mock.total_calls(), 0);
        assert_eq!(repository.operation_state("").await, OperationState::Idle);
    }

    #[tokio::test]
    async fn test_manual_policy_schedules_nothing() {
        let (mock, repository) = seeded();
        repository.publish(&draft("7")).await.unwrap();
        repository.settle().await;

        assert_eq!(mock.calls(SheetOperation::List), 0);
        assert_eq!(ids(&repository.articles().await), vec!["7"]);
    }
}
