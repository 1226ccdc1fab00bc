use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};
use time::macros::format_description;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    InvalidRotation(String),
    AppenderFailed(String),
    InitFailed(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::InvalidLevel(s) => write!(
                f, "Log level must be one of TRACE, DEBUG, INFO, WARN, ERROR: {}", s
            ),
            LoggingError::InvalidRotation(s) => write!(
                f, "Log rotation must be one of DAILY, HOURLY, MINUTELY, NEVER: {}", s
            ),
            LoggingError::AppenderFailed(s) => write!(f, "Failed to create log file appender: {}", s),
            LoggingError::InitFailed(s) => write!(f, "Failed to install global subscriber: {}", s),
        }
    }
}

impl std::error::Error for LoggingError {}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// 로그 파일을 저장할 디렉토리, `name`과 함께 설정되어야 파일로 로깅한다.
    /// 설정되지 않으면 stderr로만 출력한다.
    dir: Option<String>,
    name: Option<String>,

    /// 최대 로그 파일 개수로 로그 파일이 설정한 개수보다 커질 경우 기존의 로그파일들은 삭제 된다.
    /// 설정 되지 않을 시 로그 파일은 삭제 되지 않는다.
    keep: Option<usize>,

    /// 지정된 로그 레벨 이상만 로깅된다. 설정하지 않을시 기본값은 INFO로 설정 된다.
    ///
    /// 이 값은 [`tracing::Level`]로 변환 됨으로 자세한 사항은 해당 파일을 확인
    level: Option<String>,

    /// 로깅 파일이 분리 되는 기간으로 .log 파일 하나 당 설정된 기간 동안 로그가 기록 된다.
    /// 설정 되지 않을시 기본값은 DAILY로 설정된다.
    ///
    /// 이 값은 [`rolling::Rotation`]으로 변환 됨으로 자세한 사항은 해당 파일을 확인
    rotation: Option<String>,
}

impl Config {
    pub fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }
}

/// 전역 로거를 설정한다.
///
/// 파일 로깅이 설정된 경우 반환된 [`WorkerGuard`]가 살아 있는 동안만 파일에 기록되므로
/// 프로그램이 끝날 때까지 보관해야 한다.
pub fn set_global_logging_config(c: &Config) -> Result<Option<WorkerGuard>, LoggingError> {
    let level = match &c.level {
        Some(level) => parse_level(level)?,
        None => tracing::Level::INFO,
    };
    let timer = LocalTime::new(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"));

    // 리포트가 stdout으로 출력되므로 콘솔 로그는 stderr로 보낸다
    let (Some(dir), Some(name)) = (&c.dir, &c.name) else {
        tracing_subscriber::fmt()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_timer(timer)
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
        return Ok(None);
    };

    let rotation = match &c.rotation {
        Some(rotation) => parse_rotation(rotation)?,
        None => rolling::Rotation::DAILY,
    };
    let mut file_appender = rolling::RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(name.clone())
        .filename_suffix("log");
    if let Some(keep) = c.keep {
        file_appender = file_appender.max_log_files(keep);
    }
    let file_appender = file_appender.build(dir)
        .map_err(|e| LoggingError::AppenderFailed(e.to_string()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let writer = std::io::stderr.and(non_blocking);

    tracing_subscriber::fmt()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_timer(timer)
        .with_max_level(level)
        .with_writer(writer)
        .try_init()
        .map_err(|e| LoggingError::InitFailed(e.to_string()))?;

    Ok(Some(guard))
}

fn parse_rotation(s: &str) -> Result<rolling::Rotation, LoggingError> {
    match s.to_uppercase().as_str() {
        "DAILY" => Ok(rolling::Rotation::DAILY),
        "HOURLY" => Ok(rolling::Rotation::HOURLY),
        "MINUTELY" => Ok(rolling::Rotation::MINUTELY),
        "NEVER" => Ok(rolling::Rotation::NEVER),
        _ => Err(LoggingError::InvalidRotation(s.to_owned())),
    }
}

fn parse_level(l: &str) -> Result<tracing::Level, LoggingError> {
    match l.to_uppercase().as_str() {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" => Ok(tracing::Level::WARN),
        "ERROR" => Ok(tracing::Level::ERROR),
        _ => Err(LoggingError::InvalidLevel(l.to_owned())),
    }
}
