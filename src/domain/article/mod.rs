pub mod error;
pub mod model;
pub mod rating;
pub mod repository;
pub mod search;
pub mod store;

// 公開APIの再エクスポート

// error.rsから
pub use error::{ArticleError, ArticleResult, ValidationError};

// model.rsから
pub use model::{
    format_display_date, require_id, today_display_date, Article, ArticleDraft, ArticleField,
    ArticleFields, Category, MAX_RATING,
};

// rating.rsから
pub use rating::RatingSynchronizer;

// repository.rsから
pub use repository::{ArticleRepository, OperationState, ReconcilePolicy};

// search.rsから
pub use search::{search_articles, SearchField};

// store.rsから
pub use store::RemoteArticleStore;
