use tracing_subscriber::EnvFilter;

/// ログ出力を初期化する
///
/// `RUST_LOG`が未設定なら`info`。結果表示と混ざらないよう標準エラーに出す。
/// 二重に初期化しても失敗にはしない。
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
