use crate::types::{InfraError, InfraResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// シートAPIが扱うフラットな1行
///
/// 値は文字列または数値で返ってくるため、型付けはドメイン側で行う。
pub type SheetRow = Map<String, Value>;

/// シートAPIに対する操作の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetOperation {
    List,
    Create,
    Replace,
    Remove,
}

impl SheetOperation {
    fn label(&self) -> &'static str {
        match self {
            Self::List => "行一覧の取得",
            Self::Create => "行の追加",
            Self::Replace => "行の置換",
            Self::Remove => "行の削除",
        }
    }
}

/// セルの値を文字列として取り出す
///
/// 空文字列と文字列・数値以外の値は「未設定」として扱う。
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 行の`id`セルが指定IDと一致するか
pub fn row_has_id(row: &SheetRow, id: &str) -> bool {
    row.get("id")
        .and_then(cell_text)
        .is_some_and(|row_id| row_id == id)
}

/// シートAPIクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
/// 置換は常に行全体を要求し、送らなかった列は消える点に注意。
#[async_trait]
pub trait SheetClient: Send + Sync {
    /// 全行を到着順で取得する
    async fn list_rows(&self) -> InfraResult<Vec<SheetRow>>;

    /// 行を末尾に追加する
    async fn create_row(&self, row: &SheetRow) -> InfraResult<()>;

    /// `id`が一致する行を丸ごと置き換える
    async fn replace_row(&self, id: &str, row: &SheetRow) -> InfraResult<()>;

    /// `id`が一致する行を削除する
    async fn remove_row(&self, id: &str) -> InfraResult<()>;
}

/// `reqwest` を使用した本番用のシートAPIクライアント実装
pub struct ReqwestSheetClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestSheetClient {
    /// 新しいクライアントを作成
    ///
    /// # Arguments
    /// * `base_url` - シートのコレクションURL
    /// * `timeout` - 1リクエストあたりのタイムアウト
    pub fn new(base_url: &str, timeout: Duration) -> InfraResult<Self> {
        let base_url = Url::parse(base_url).map_err(|_| InfraError::invalid_url(base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(InfraError::invalid_url(base_url.as_str()));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            timeout,
        })
    }

    /// `{base}/id/{id}` 形式のURLを組み立てる（IDはパスセグメントとしてエンコード）
    pub fn row_url(&self, id: &str) -> InfraResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| InfraError::invalid_url(self.base_url.as_str()))?;
            segments.pop_if_empty().push("id").push(id.trim());
        }
        Ok(url)
    }
}

/// 2xx以外のレスポンスをステータスエラーに変換する
async fn ensure_success(operation: SheetOperation, response: Response) -> InfraResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match operation {
        SheetOperation::Create => Err(InfraError::rejected(status.as_u16(), body)),
        _ => Err(InfraError::status(operation.label(), status.as_u16(), body)),
    }
}

#[async_trait]
impl SheetClient for ReqwestSheetClient {
    async fn list_rows(&self) -> InfraResult<Vec<SheetRow>> {
        let operation = SheetOperation::List;
        tracing::debug!(url = %self.base_url, "シートの行一覧を取得");

        let response = self
            .client
            .get(self.base_url.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| InfraError::transport(operation.label(), e))?;
        let response = ensure_success(operation, response).await?;

        let text = response
            .text()
            .await
            .map_err(|e| InfraError::transport(operation.label(), e))?;
        serde_json::from_str(&text).map_err(|e| InfraError::decode("行一覧のJSON", e))
    }

    async fn create_row(&self, row: &SheetRow) -> InfraResult<()> {
        let operation = SheetOperation::Create;
        tracing::debug!(url = %self.base_url, "シートに行を追加");

        let response = self
            .client
            .post(self.base_url.clone())
            .header("Accept", "application/json")
            .json(row)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| InfraError::transport(operation.label(), e))?;
        ensure_success(operation, response).await?;
        Ok(())
    }

    async fn replace_row(&self, id: &str, row: &SheetRow) -> InfraResult<()> {
        let operation = SheetOperation::Replace;
        let url = self.row_url(id)?;
        tracing::debug!(url = %url, "シートの行を置換");

        let response = self
            .client
            .put(url)
            .header("Accept", "application/json")
            .json(row)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| InfraError::transport(operation.label(), e))?;
        ensure_success(operation, response).await?;
        Ok(())
    }

    async fn remove_row(&self, id: &str) -> InfraResult<()> {
        let operation = SheetOperation::Remove;
        let url = self.row_url(id)?;
        tracing::debug!(url = %url, "シートの行を削除");

        let response = self
            .client
            .delete(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| InfraError::transport(operation.label(), e))?;
        ensure_success(operation, response).await?;
        Ok(())
    }
}

/// テスト用のインメモリ・シートクライアント
///
/// この実装はテスト時にDIされ、実際のHTTPリクエストを行わずに
/// シートの振る舞い（全行置換、未知IDでの404）を再現します。
/// 操作ごとの呼び出し回数を記録し、任意の操作を失敗させられます。
#[derive(Default)]
pub struct MockSheetClient {
    rows: Mutex<Vec<SheetRow>>,
    failures: Mutex<HashMap<SheetOperation, u16>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    replace_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl MockSheetClient {
    /// 空のシートを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した行を持つシートを作成
    pub fn with_rows(rows: Vec<SheetRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// 以後、指定操作を`status`で失敗させる
    pub fn fail_on(&self, operation: SheetOperation, status: u16) {
        self.lock_failures().insert(operation, status);
    }

    /// 失敗設定を解除する
    pub fn recover(&self, operation: SheetOperation) {
        self.lock_failures().remove(&operation);
    }

    /// 現在の行のスナップショット
    pub fn rows(&self) -> Vec<SheetRow> {
        self.lock_rows().clone()
    }

    /// 裏で別の端末が行を書き換えたことを再現する
    pub fn put_row_directly(&self, row: SheetRow) {
        self.lock_rows().push(row);
    }

    /// 指定操作の呼び出し回数
    pub fn calls(&self, operation: SheetOperation) -> usize {
        self.counter(operation).load(Ordering::SeqCst)
    }

    /// 全操作の呼び出し回数の合計
    pub fn total_calls(&self) -> usize {
        [
            SheetOperation::List,
            SheetOperation::Create,
            SheetOperation::Replace,
            SheetOperation::Remove,
        ]
        .iter()
        .map(|op| self.calls(*op))
        .sum()
    }

    fn counter(&self, operation: SheetOperation) -> &AtomicUsize {
        match operation {
            SheetOperation::List => &self.list_calls,
            SheetOperation::Create => &self.create_calls,
            SheetOperation::Replace => &self.replace_calls,
            SheetOperation::Remove => &self.remove_calls,
        }
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, Vec<SheetRow>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, HashMap<SheetOperation, u16>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 呼び出しを記録し、失敗設定があればエラーを返す
    fn enter(&self, operation: SheetOperation) -> InfraResult<()> {
        self.counter(operation).fetch_add(1, Ordering::SeqCst);
        match self.lock_failures().get(&operation) {
            Some(&status) if operation == SheetOperation::Create => {
                Err(InfraError::rejected(status, "モックによる拒否"))
            }
            Some(&status) => Err(InfraError::status(
                operation.label(),
                status,
                "モックHTTPエラー",
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SheetClient for MockSheetClient {
    async fn list_rows(&self) -> InfraResult<Vec<SheetRow>> {
        self.enter(SheetOperation::List)?;
        Ok(self.rows())
    }

    async fn create_row(&self, row: &SheetRow) -> InfraResult<()> {
        self.enter(SheetOperation::Create)?;
        self.lock_rows().push(row.clone());
        Ok(())
    }

    async fn replace_row(&self, id: &str, row: &SheetRow) -> InfraResult<()> {
        let operation = SheetOperation::Replace;
        self.enter(operation)?;
        let id = id.trim();
        let mut rows = self.lock_rows();
        let mut matched = false;
        for existing in rows.iter_mut().filter(|r| row_has_id(r, id)) {
            *existing = row.clone();
            matched = true;
        }
        if matched {
            Ok(())
        } else {
            Err(InfraError::status(operation.label(), 404, "Not Found"))
        }
    }

    async fn remove_row(&self, id: &str) -> InfraResult<()> {
        let operation = SheetOperation::Remove;
        self.enter(operation)?;
        let id = id.trim();
        let mut rows = self.lock_rows();
        let before = rows.len();
        rows.retain(|r| !row_has_id(r, id));
        if rows.len() < before {
            Ok(())
        } else {
            Err(InfraError::status(operation.label(), 404, "Not Found"))
        }
    }
}
