use super::error::ValidationError;
use super::model::Article;
use std::fmt;
use std::str::FromStr;

/// 検索対象の項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    #[default]
    All,
    Name,
    Id,
    Author,
    Date,
    Category,
    Rating,
}

impl SearchField {
    pub const ALL: [SearchField; 7] = [
        Self::All,
        Self::Name,
        Self::Id,
        Self::Author,
        Self::Date,
        Self::Category,
        Self::Rating,
    ];

    fn key(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Name => "name",
            Self::Id => "id",
            Self::Author => "author",
            Self::Date => "date",
            Self::Category => "category",
            Self::Rating => "rating",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SearchField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.key() == wanted)
            .ok_or_else(|| ValidationError::UnknownSearchField {
                value: s.to_string(),
            })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// 1件の記事が検索語に一致するか
///
/// `needle`は小文字化済みであること。IDと評価は文字列表現で比較する。
fn matches(article: &Article, needle: &str, field: SearchField) -> bool {
    match field {
        SearchField::Name => contains_ignore_case(&article.name, needle),
        SearchField::Id => contains_ignore_case(&article.id, needle),
        SearchField::Author => contains_ignore_case(&article.author, needle),
        SearchField::Date => contains_ignore_case(&article.date, needle),
        SearchField::Category => contains_ignore_case(&article.category, needle),
        SearchField::Rating => article.ratings.to_string().contains(needle),
        // 「すべて」では未評価（0）の記事は評価で一致しない
        SearchField::All => {
            [
                SearchField::Name,
                SearchField::Id,
                SearchField::Author,
                SearchField::Date,
                SearchField::Category,
            ]
            .iter()
            .any(|f| matches(article, needle, *f))
                || (article.ratings > 0 && matches(article, needle, SearchField::Rating))
        }
    }
}

/// 記事一覧から検索語を含むものを元の並びのまま返す
///
/// 空白だけの検索語は何も返さない。
pub fn search_articles<'a>(
    articles: &'a [Article],
    query: &str,
    field: SearchField,
) -> Vec<&'a Article> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    articles
        .iter()
        .filter(|article| matches(article, &needle, field))
        .collect()
}
