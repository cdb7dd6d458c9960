use super::error::ValidationError;
use crate::infra::api::http::{cell_text, SheetRow};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// 行に値が無い場合の既定値
pub const DEFAULT_NAME: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_DATE: &str = "No date";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_CONTENT: &str = "No content";

/// 評価の上限
pub const MAX_RATING: u8 = 5;

/// 表示用の日付書式（日/月/年）
const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// 日付を`DD/MM/YYYY`形式の文字列にする
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// 今日の日付（ローカル時刻）を表示用の書式で返す
pub fn today_display_date() -> String {
    format_display_date(Local::now().date_naive())
}

// 記事エンティティ（シートの1行に対応）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub name: String,
    pub author: String,
    pub date: String,
    pub category: String,
    pub content: String,
    pub ratings: u8,
}

impl Article {
    /// シートの行を記事に変換する
    ///
    /// 欠けている列は既定値で補う。`id`が無い行は到着順の位置（0始まり）をIDにする。
    /// この位置IDは実在のIDと重なりうる。重なった場合、キャッシュ上の更新や削除は
    /// 同じIDを持つすべてのエントリに及ぶ（シート側の`id`指定の操作と同じ扱い）。
    pub fn from_row(row: &SheetRow, index: usize) -> Self {
        let text = |key: &str, default: &str| {
            row.get(key)
                .and_then(cell_text)
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            id: text("id", &index.to_string()),
            name: text("name", DEFAULT_NAME),
            author: text("author", DEFAULT_AUTHOR),
            date: text("date", DEFAULT_DATE),
            category: text("category", DEFAULT_CATEGORY),
            content: text("content", DEFAULT_CONTENT),
            ratings: row.get("ratings").map(parse_rating).unwrap_or(0),
        }
    }

    /// シートに書き込む完全な行を作る
    pub fn to_row(&self) -> SheetRow {
        let mut row = SheetRow::new();
        row.insert("id".into(), Value::from(self.id.clone()));
        row.insert("name".into(), Value::from(self.name.clone()));
        row.insert("author".into(), Value::from(self.author.clone()));
        row.insert("date".into(), Value::from(self.date.clone()));
        row.insert("category".into(), Value::from(self.category.clone()));
        row.insert("content".into(), Value::from(self.content.clone()));
        row.insert("ratings".into(), Value::from(self.ratings));
        row
    }

    /// 入稿内容から未評価の記事を作る
    pub fn from_draft(draft: ArticleDraft) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            author: draft.author,
            date: draft.date,
            category: draft.category,
            content: draft.content,
            ratings: 0,
        }
    }

    /// IDと評価を保ったまま、編集内容を反映した記事を返す
    pub fn with_fields(&self, fields: &ArticleFields) -> Self {
        Self {
            id: self.id.clone(),
            name: fields.name.clone(),
            author: fields.author.clone(),
            date: fields.date.clone(),
            category: fields.category.clone(),
            content: fields.content.clone(),
            ratings: self.ratings,
        }
    }

    /// 評価だけを差し替えた記事を返す
    pub fn with_rating(&self, ratings: u8) -> Self {
        Self {
            ratings,
            ..self.clone()
        }
    }
}

/// 評価セルを解釈する（数値・数値文字列のみ、0〜5に丸める）
fn parse_rating(value: &Value) -> u8 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.round().clamp(0.0, MAX_RATING as f64) as u8,
        _ => 0,
    }
}

/// 記事の入力項目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Id,
    Name,
    Author,
    Date,
    Category,
    Content,
}

impl fmt::Display for ArticleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Id => "ID",
            Self::Name => "記事名",
            Self::Author => "著者",
            Self::Date => "日付",
            Self::Category => "カテゴリ",
            Self::Content => "本文",
        };
        f.write_str(label)
    }
}

/// 選択可能な12種類のカテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Health,
    Business,
    Education,
    Sports,
    Entertainment,
    Science,
    Travel,
    Food,
    Fashion,
    Finance,
    Politics,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Self::Technology,
        Self::Health,
        Self::Business,
        Self::Education,
        Self::Sports,
        Self::Entertainment,
        Self::Science,
        Self::Travel,
        Self::Food,
        Self::Fashion,
        Self::Finance,
        Self::Politics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Health => "Health",
            Self::Business => "Business",
            Self::Education => "Education",
            Self::Sports => "Sports",
            Self::Entertainment => "Entertainment",
            Self::Science => "Science",
            Self::Travel => "Travel",
            Self::Food => "Food",
            Self::Fashion => "Fashion",
            Self::Finance => "Finance",
            Self::Politics => "Politics",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Technology => "💻",
            Self::Health => "🏥",
            Self::Business => "💼",
            Self::Education => "🎓",
            Self::Sports => "⚽",
            Self::Entertainment => "🎬",
            Self::Science => "🔬",
            Self::Travel => "✈️",
            Self::Food => "🍽️",
            Self::Fashion => "👗",
            Self::Finance => "💰",
            Self::Politics => "🏛️",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownCategory {
                label: wanted.to_string(),
            })
    }
}

/// カテゴリ文字列を検証し、正規の表記に揃える
fn canonical_category(label: &str) -> Result<String, ValidationError> {
    if label.is_empty() {
        return Err(ValidationError::MissingField {
            field: ArticleField::Category,
        });
    }
    label.parse::<Category>().map(|c| c.label().to_string())
}

fn require(value: &str, field: ArticleField) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

/// 既存記事を指すIDを検証し、前後の空白を除いて返す
pub fn require_id(id: &str) -> Result<&str, ValidationError> {
    let id = id.trim();
    require(id, ArticleField::Id)?;
    Ok(id)
}

/// 新規入稿の入力内容
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleDraft {
    pub id: String,
    pub name: String,
    pub author: String,
    pub date: String,
    pub category: String,
    pub content: String,
}

impl ArticleDraft {
    /// 日付を今日にした入稿内容を作成
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author: author.into(),
            date: today_display_date(),
            category: category.into(),
            content: content.into(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// 前後の空白を取り除いた入稿内容を返す
    pub fn trimmed(&self) -> Self {
        Self {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            author: self.author.trim().to_string(),
            date: self.date.trim().to_string(),
            category: self.category.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }

    /// 入力を検証し、書き込み可能な形に正規化する
    ///
    /// 空の項目はID、記事名、著者、日付、カテゴリ、本文の順で最初の1つを報告する。
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let mut draft = self.trimmed();
        require(&draft.id, ArticleField::Id)?;
        require(&draft.name, ArticleField::Name)?;
        require(&draft.author, ArticleField::Author)?;
        require(&draft.date, ArticleField::Date)?;
        require(&draft.category, ArticleField::Category)?;
        require(&draft.content, ArticleField::Content)?;
        draft.category = canonical_category(&draft.category)?;
        Ok(draft)
    }
}

/// 既存記事の編集内容（IDと評価は含まない）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleFields {
    pub name: String,
    pub author: String,
    pub date: String,
    pub category: String,
    pub content: String,
}

impl ArticleFields {
    /// 日付を今日にした編集内容を作成
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        category: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            date: today_display_date(),
            category: category.into(),
            content: content.into(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            author: self.author.trim().to_string(),
            date: self.date.trim().to_string(),
            category: self.category.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }

    /// 入力を検証し、書き込み可能な形に正規化する
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let mut fields = self.trimmed();
        require(&fields.name, ArticleField::Name)?;
        require(&fields.author, ArticleField::Author)?;
        require(&fields.date, ArticleField::Date)?;
        require(&fields.category, ArticleField::Category)?;
        require(&fields.content, ArticleField::Content)?;
        fields.category = canonical_category(&fields.category)?;
        Ok(fields)
    }
}
