use crate::domain::article::{ArticleError, ArticleResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 利用者のロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 記事を読み、評価する
    Reader,
    /// 記事を入稿・編集・削除する
    Publisher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => f.write_str("reader"),
            Self::Publisher => f.write_str("publisher"),
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" => Ok(Self::Reader),
            "publisher" => Ok(Self::Publisher),
            _ => Err(ValidationError::UnknownRole {
                value: s.to_string(),
            }),
        }
    }
}

/// 記事を変更する操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Publish,
    Edit,
    Delete,
    Rate,
}

impl Action {
    /// この操作を許可されたロール
    pub fn allowed_role(&self) -> Role {
        match self {
            Self::Rate => Role::Reader,
            Self::Publish | Self::Edit | Self::Delete => Role::Publisher,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Publish => "記事を入稿",
            Self::Edit => "記事を編集",
            Self::Delete => "記事を削除",
            Self::Rate => "記事を評価",
        };
        f.write_str(label)
    }
}

/// サインアップした利用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    name: String,
    role: Role,
}

impl Session {
    /// 利用者名（前後の空白は除去）とロールからセッションを作る
    pub fn new(name: &str, role: Role) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyUserName);
        }
        Ok(Self {
            name: name.to_string(),
            role,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// 操作がロールに許可されているか確認する
    pub fn authorize(&self, action: Action) -> ArticleResult<()> {
        if action.allowed_role() == self.role {
            Ok(())
        } else {
            Err(ArticleError::AccessDenied {
                role: self.role,
                action,
            })
        }
    }
}
