use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RUST_LOG가 없거나 잘못된 경우 `default_directive`를 사용합니다.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_or_default(from_env.as_deref(), default_directive)
}

fn filter_or_default(directives: Option<&str>, default_directive: &str) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

/// 구조화된 로깅을 초기화합니다.
/// JSON 형식의 로그를 stdout으로 출력하며, `log` 크레이트의 레코드도 함께 수집합니다.
pub fn init_telemetry(default_directive: &str) {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(formatting_layer)
        .init();
}
