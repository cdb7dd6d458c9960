use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetpress::{
    app::{execute, Command, EditInput, PublishInput},
    domain::{
        article::{ArticleError, ArticleRepository, SearchField},
        session::{Role, Session},
    },
    infra::{api::http::ReqwestSheetClient, config::AppConfig, logging::init_logging},
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sheetpress", about = "シートAPIで記事を入稿・閲覧・評価する")]
struct Args {
    /// 設定ファイル（YAML）
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// 利用者名
    #[arg(long)]
    name: String,

    /// ロール（reader / publisher）
    #[arg(long)]
    role: Role,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// 記事一覧（新しく取得した順）
    List,
    /// 記事の詳細
    Show { id: String },
    /// 記事を検索
    Search {
        query: String,
        /// all / name / id / author / date / category / rating
        #[arg(long, default_value = "all")]
        field: SearchField,
    },
    /// 記事を入稿（publisherのみ）
    Publish {
        #[arg(long)]
        id: String,
        #[arg(long = "title")]
        name: String,
        /// 省略時は利用者名
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        category: String,
        #[arg(long)]
        content: String,
        /// DD/MM/YYYY（省略時は今日）
        #[arg(long)]
        date: Option<String>,
    },
    /// 記事を編集（publisherのみ）
    Edit {
        id: String,
        #[arg(long = "title")]
        name: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        content: String,
        /// DD/MM/YYYY（省略時は今日）
        #[arg(long)]
        date: Option<String>,
    },
    /// 記事を削除（publisherのみ）
    Delete { id: String },
    /// 記事を1〜5で評価（readerのみ）
    Rate { id: String, value: u8 },
    /// 選択できるカテゴリ
    Categories,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::List => Command::List,
            CliCommand::Show { id } => Command::Show { id },
            CliCommand::Search { query, field } => Command::Search { query, field },
            CliCommand::Publish {
                id,
                name,
                author,
                category,
                content,
                date,
            } => Command::Publish(PublishInput {
                id,
                name,
                author,
                category,
                content,
                date,
            }),
            CliCommand::Edit {
                id,
                name,
                author,
                category,
                content,
                date,
            } => Command::Edit {
                id,
                input: EditInput {
                    name,
                    author,
                    category,
                    content,
                    date,
                },
            },
            CliCommand::Delete { id } => Command::Delete { id },
            CliCommand::Rate { id, value } => Command::Rate { id, value },
            CliCommand::Categories => Command::Categories,
        }
    }
}

async fn run(args: Args) -> Result<String> {
    let config = AppConfig::load(args.config.as_deref()).context("設定の読み込みに失敗")?;
    let session = Session::new(&args.name, args.role)?;
    tracing::debug!(sheet_url = %config.sheet_url, role = %session.role(), "設定を読み込みました");

    let client = ReqwestSheetClient::new(&config.sheet_url, config.request_timeout())
        .context("シートAPIクライアントの初期化に失敗")?;
    let repository = ArticleRepository::new(Arc::new(client), config.reconcile_policy());

    let message = execute(&repository, &session, args.command.into()).await?;
    Ok(message)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("エラー: {:#}", e);
            // 入力や権限の誤りは通信エラーと区別する
            match e.downcast_ref::<ArticleError>() {
                Some(err) if err.is_client_side() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
