//! 日志模块：env_logger 控制台彩色输出 + 文件镜像 + 按大小轮转
use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, Once};

// ==================== 配置常量 ====================
const LOG_DIR: &str = "LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_LEVEL: &str = "LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const LOG_FILE_NAME: &str = "eth-stream-relay.log";
const LOG_MAX_SIZE_MB: u64 = 10;
const LOG_MAX_ROTATIONS: usize = 5;

static INIT_LOGGER: Once = Once::new();
// 全局文件写入器，轮转后替换
static FILE_WRITER: Mutex<Option<File>> = Mutex::new(None);

fn parse_level(level: &str) -> LevelFilter {
    match level {
        "TRACE" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => {
            eprintln!("⚠️ 无效日志级别「{}」，使用默认 INFO", level);
            LevelFilter::Info
        }
    }
}

// ==================== 初始化日志系统 ====================
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let log_dir = std::env::var(LOG_DIR).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let log_level = std::env::var(LOG_LEVEL)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_uppercase();
        let level_filter = parse_level(&log_level);

        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("❌ 创建日志目录失败: {}", e);
        }
        let log_dir = Path::new(&log_dir);
        if let Err(e) = rotate_logs(
            log_dir,
            LOG_FILE_NAME,
            LOG_MAX_SIZE_MB * 1024 * 1024,
            LOG_MAX_ROTATIONS,
        ) {
            eprintln!("⚠️ 日志轮转失败: {}", e);
        }

        let log_file_path = log_dir.join(LOG_FILE_NAME);
        let file_enabled = match open_log_file(&log_file_path) {
            Ok(f) => {
                if let Ok(mut writer) = FILE_WRITER.lock() {
                    *writer = Some(f);
                }
                true
            }
            Err(e) => {
                eprintln!("❌ 创建日志文件失败: {}", e);
                false
            }
        };

        let mut builder = Builder::from_default_env();
        builder
            .filter(None, level_filter)
            .filter(Some("tungstenite"), LevelFilter::Warn)
            .filter(Some("tokio_tungstenite"), LevelFilter::Warn)
            .filter(Some("hyper"), LevelFilter::Warn)
            .write_style(WriteStyle::Always)
            .format(move |f: &mut Formatter, record: &Record| {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f");

                let level_color = match record.level() {
                    Level::Error => "\x1b[91m",
                    Level::Warn => "\x1b[93m",
                    Level::Info => "\x1b[92m",
                    Level::Debug => "\x1b[96m",
                    Level::Trace => "\x1b[95m",
                };
                let reset = "\x1b[0m";
                let module = record.module_path().unwrap_or("unknown");

                let console_log = writeln!(
                    f,
                    "[{}] [{}{:>5}{}] [\x1b[31m{}{}] - {}",
                    now,
                    level_color,
                    record.level(),
                    reset,
                    module,
                    reset,
                    record.args()
                );

                if file_enabled {
                    let file_log = format!(
                        "[{}] [{}] [{}] - {}\n",
                        now,
                        record.level(),
                        module,
                        record.args()
                    );
                    // 文件写入失败不影响控制台输出
                    if let Ok(mut writer) = FILE_WRITER.lock() {
                        if let Some(file) = writer.as_mut() {
                            let _ = file.write_all(file_log.as_bytes());
                        }
                    }
                }

                console_log
            })
            .target(Target::Stdout);

        if let Err(e) = builder.try_init() {
            eprintln!("❌ 日志初始化失败: {}", e);
        } else {
            log::info!(
                "✅ 日志系统初始化完成 | 级别: {} | 日志文件: {}",
                log_level,
                log_file_path.display()
            );
        }
    });
}

/// 追加写入，保留之前运行的日志
fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

// ==================== 日志轮转 ====================
/// `name` 超过 `max_bytes` 时依次改名为 `name.1` ... `name.{rotations}`，最旧的被覆盖
fn rotate_logs(dir: &Path, name: &str, max_bytes: u64, rotations: usize) -> io::Result<()> {
    let current = dir.join(name);
    if !current.exists() || fs::metadata(&current)?.len() < max_bytes {
        return Ok(());
    }

    let rotated = |i: usize| dir.join(format!("{}.{}", name, i));
    for i in (1..rotations).rev() {
        if rotated(i).exists() {
            fs::rename(rotated(i), rotated(i + 1))?;
        }
    }
    fs::rename(&current, rotated(1))
}

// ==================== 便捷日志宏 ====================
#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_filters() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("verbose"), LevelFilter::Info);
    }

    #[test]
    fn oversized_log_is_shifted_into_rotation() {
        let dir = std::env::temp_dir().join(format!("relay-log-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.log"), vec![b'x'; 64]).unwrap();
        fs::write(dir.join("app.log.1"), b"older").unwrap();

        rotate_logs(&dir, "app.log", 32, 3).unwrap();

        assert!(!dir.join("app.log").exists());
        assert_eq!(fs::read(dir.join("app.log.1")).unwrap().len(), 64);
        assert_eq!(fs::read(dir.join("app.log.2")).unwrap(), b"older");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reopening_the_log_keeps_earlier_runs() {
        let dir = std::env::temp_dir().join(format!("relay-log-append-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("app.log");
        fs::write(&path, b"first run\n").unwrap();

        let mut file = open_log_file(&path).unwrap();
        file.write_all(b"second run\n").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&path).unwrap(), "first run\nsecond run\n");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn small_log_is_left_alone() {
        let dir = std::env::temp_dir().join(format!("relay-log-small-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("app.log"), b"tiny").unwrap();

        rotate_logs(&dir, "app.log", 32, 3).unwrap();

        assert!(dir.join("app.log").exists());
        assert!(!dir.join("app.log.1").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
