pub mod log;

use crate::fee::table::FeeTable;
use serde::Deserialize;
use std::env;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    fee: FeeTable,
    #[serde(default)]
    logger: log::Config,
}

impl AppConfig {
    pub fn fee(&self) -> &FeeTable {
        &self.fee
    }

    pub fn logger(&self) -> &log::Config {
        &self.logger
    }
}

/// 실행 환경에 따라 .env 파일을 로드한다.
pub fn load_dotenv() {
    let env_filename = env::var("RUN_MODE")
        .map(|env| format!(".env.{}", env))
        .unwrap_or_else(|_| ".env".into());

    dotenvy::from_filename(env_filename).ok();
}

/// `config/{RUN_MODE}.json`과 `APP__` 접두어 환경 변수에서 설정을 읽는다.
/// 설정 파일이 없으면 기본 요율표를 사용한다.
///
/// 환경 변수 이름은 `APP__` 뒤에 설정 키를 `__`로 이어 붙인다.
/// 예) `APP__FEE__GRACE__ENABLED=true`, `APP__FEE__RATES__NEW_RELEASE=1.20`, `APP__LOGGER__LEVEL=DEBUG`
pub fn load_config() -> Result<AppConfig, ::config::ConfigError> {
    let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    load_config_from(&format!("config/{}.json", env))
}

pub fn load_config_from(path: &str) -> Result<AppConfig, ::config::ConfigError> {
    load_config_with(path, None)
}

/// `vars`가 주어지면 프로세스 환경 변수 대신 사용한다.
fn load_config_with(
    path: &str,
    vars: Option<::config::Map<String, String>>,
) -> Result<AppConfig, ::config::ConfigError> {
    let environment = ::config::Environment::with_prefix("APP")
        .prefix_separator("__")
        .separator("__")
        .source(vars);

    let config = ::config::Config::builder()
        .add_source(::config::File::with_name(path).required(false))
        .add_source(environment)
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.fee.validate().map_err(::config::ConfigError::Message)?;

    Ok(app)
}
