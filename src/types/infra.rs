use thiserror::Error;

/// インフラストラクチャ層のエラー型
/// シートAPIとの通信、レスポンスの解析など基盤的なエラーを定義
#[derive(Error, Debug)]
pub enum InfraError {
    /// 通信そのものの失敗（接続不可、タイムアウトなど）
    #[error("通信エラー: {operation} - {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx以外のステータスが返った
    #[error("APIエラー: {operation} - HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    /// 行の追加がストアに拒否された
    #[error("行の追加が拒否されました: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// レスポンスの解析に失敗
    #[error("レスポンスの解析に失敗: {context} - {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// リクエストURLを組み立てられない
    #[error("不正なURLです: {url}")]
    InvalidUrl { url: String },
}

impl InfraError {
    /// 通信エラーを作成
    pub fn transport<O: Into<String>>(operation: O, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// ステータスエラーを作成
    pub fn status<O: Into<String>, B: Into<String>>(operation: O, status: u16, body: B) -> Self {
        Self::Status {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// 追加拒否エラーを作成
    pub fn rejected<B: Into<String>>(status: u16, body: B) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// 解析エラーを作成
    pub fn decode<C: Into<String>>(context: C, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// 不正URLエラーを作成
    pub fn invalid_url<U: Into<String>>(url: U) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// ストアが返したHTTPステータス（通信失敗の場合はNone）
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// インフラエラーのResult型エイリアス
pub type InfraResult<T> = std::result::Result<T, InfraError>;
