use crate::domain::{
    article::{
        require_id, Article, ArticleDraft, ArticleError, ArticleFields, ArticleRepository,
        ArticleResult, Category, RatingSynchronizer, SearchField,
    },
    session::{Action, Session},
};

/// 検索結果で表示する本文の最大文字数
const PREVIEW_CHARS: usize = 100;

/// 入稿時の入力
#[derive(Debug, Clone, Default)]
pub struct PublishInput {
    pub id: String,
    pub name: String,
    /// 省略時は利用者名
    pub author: Option<String>,
    pub category: String,
    pub content: String,
    /// 省略時は今日の日付
    pub date: Option<String>,
}

/// 編集時の入力
#[derive(Debug, Clone, Default)]
pub struct EditInput {
    pub name: String,
    pub author: String,
    pub category: String,
    pub content: String,
    /// 省略時は今日の日付
    pub date: Option<String>,
}

/// 画面操作に対応するコマンド
#[derive(Debug, Clone)]
pub enum Command {
    List,
    Show { id: String },
    Search { query: String, field: SearchField },
    Publish(PublishInput),
    Edit { id: String, input: EditInput },
    Delete { id: String },
    Rate { id: String, value: u8 },
    Categories,
}

impl PublishInput {
    fn to_draft(&self, session: &Session) -> ArticleDraft {
        let author = self
            .author
            .clone()
            .unwrap_or_else(|| session.name().to_string());
        let draft = ArticleDraft::new(
            self.id.clone(),
            self.name.clone(),
            author,
            self.category.clone(),
            self.content.clone(),
        );
        match &self.date {
            Some(date) => draft.with_date(date.clone()),
            None => draft,
        }
    }
}

impl EditInput {
    fn to_fields(&self) -> ArticleFields {
        let fields = ArticleFields::new(
            self.name.clone(),
            self.author.clone(),
            self.category.clone(),
            self.content.clone(),
        );
        match &self.date {
            Some(date) => fields.with_date(date.clone()),
            None => fields,
        }
    }
}

/// 記事を1行で表示する
pub fn format_article_line(article: &Article) -> String {
    format!(
        "[{}] {} / {} / {} / {} / ★{}",
        article.id, article.name, article.author, article.date, article.category, article.ratings
    )
}

/// 記事の詳細を表示する
pub fn format_article_detail(article: &Article) -> String {
    format!(
        "ID: {}\n記事名: {}\n著者: {}\n日付: {}\nカテゴリ: {}\n評価: {}/5\n\n{}",
        article.id,
        article.name,
        article.author,
        article.date,
        article.category,
        article.ratings,
        article.content
    )
}

/// 本文の先頭だけを取り出す（文字単位）
pub fn content_preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let head: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

fn format_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "記事がありません".to_string();
    }
    let mut lines: Vec<String> = articles.iter().map(format_article_line).collect();
    lines.push(format!("記事数: {}件", articles.len()));
    lines.join("\n")
}

fn format_categories() -> String {
    Category::ALL
        .iter()
        .map(|c| format!("{} {}", c.icon(), c.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// コマンドを実行し、利用者に見せるメッセージを返す
///
/// 権限と入力の確認は通信の前に行う。各コマンドは画面を開いた時と同様に
/// まず一覧を再取得し、書き込み系は再取得の完了まで待ってから戻る。
pub async fn execute(
    repository: &ArticleRepository,
    session: &Session,
    command: Command,
) -> ArticleResult<String> {
    match command {
        Command::Categories => Ok(format_categories()),

        Command::List => {
            repository.refresh().await?;
            Ok(format_list(&repository.articles().await))
        }

        Command::Show { id } => {
            repository.refresh().await?;
            let article = repository
                .get(&id)
                .await
                .ok_or_else(|| ArticleError::not_found(id.trim()))?;
            Ok(format_article_detail(&article))
        }

        Command::Search { query, field } => {
            repository.refresh().await?;
            let found = repository.search(&query, field).await;
            if found.is_empty() {
                return Ok("一致する記事がありません".to_string());
            }
            let mut lines: Vec<String> = found
                .iter()
                .map(|a| format!("{}\n  {}", format_article_line(a), content_preview(&a.content)))
                .collect();
            lines.push(format!("検索結果: {}件 / 全{}件", found.len(), repository.len().await));
            Ok(lines.join("\n"))
        }

        Command::Publish(input) => {
            session.authorize(Action::Publish)?;
            let draft = input.to_draft(session);
            draft.validate()?;

            repository.refresh().await?;
            let article = repository.publish(&draft).await?;
            repository.settle().await;
            Ok(format!(
                "記事を入稿しました\n日付: {}\nカテゴリ: \"{}\"",
                article.date, article.category
            ))
        }

        Command::Edit { id, input } => {
            session.authorize(Action::Edit)?;
            require_id(&id)?;
            let fields = input.to_fields();
            fields.validate()?;

            repository.refresh().await?;
            let article = repository.edit(&id, &fields).await?;
            repository.settle().await;
            Ok(format!(
                "記事を更新しました\n日付: {}\nカテゴリ: \"{}\"",
                article.date, article.category
            ))
        }

        Command::Delete { id } => {
            session.authorize(Action::Delete)?;
            require_id(&id)?;

            repository.refresh().await?;
            repository.delete(&id).await?;
            Ok("記事を削除しました".to_string())
        }

        Command::Rate { id, value } => {
            session.authorize(Action::Rate)?;
            require_id(&id)?;
            RatingSynchronizer::check_value(value)?;

            repository.refresh().await?;
            let article = repository.rate(&id, value).await?;
            repository.settle().await;
            Ok(format!("\"{}\" を★{}で評価しました", article.name, value))
        }
    }
}
