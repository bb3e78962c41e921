use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的文件数量
    pub max_concurrent: usize,
    /// 待处理文件目录
    pub input_folder: String,
    /// 导出目录
    pub output_folder: String,
    /// 项目数据库路径
    pub database_path: String,
    /// 最近文件记录路径
    pub recent_files_path: String,
    /// 最近文件最多保留条数
    pub recent_files_capacity: usize,
    /// 悬停预加载延迟（毫秒）
    pub preload_delay_ms: u64,
    /// 导出文件扩展名
    pub output_extension: String,
    /// 批量打包的压缩包文件名
    pub zip_filename: String,
    /// 逐个导出时的文件名前缀
    pub download_prefix: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            input_folder: "input".to_string(),
            output_folder: "output".to_string(),
            database_path: "data/projects.db".to_string(),
            recent_files_path: "data/recent_files.json".to_string(),
            recent_files_capacity: 10,
            preload_delay_ms: 200,
            output_extension: "pdf".to_string(),
            zip_filename: "batch_processed.zip".to_string(),
            download_prefix: "processed".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent: std::env::var("MAX_CONCURRENT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent),
            input_folder: std::env::var("INPUT_FOLDER").unwrap_or(default.input_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(default.database_path),
            recent_files_path: std::env::var("RECENT_FILES_PATH").unwrap_or(default.recent_files_path),
            recent_files_capacity: std::env::var("RECENT_FILES_CAPACITY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recent_files_capacity),
            preload_delay_ms: std::env::var("PRELOAD_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.preload_delay_ms),
            output_extension: std::env::var("OUTPUT_EXTENSION").unwrap_or(default.output_extension),
            zip_filename: std::env::var("ZIP_FILENAME").unwrap_or(default.zip_filename),
            download_prefix: std::env::var("DOWNLOAD_PREFIX").unwrap_or(default.download_prefix),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段取默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 设置了 `DOC_BATCH_CONFIG` 时读取该文件，否则读取环境变量
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("DOC_BATCH_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => Ok(Self::from_env()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent = 4\nzip_filename = \"out.zip\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.zip_filename, "out.zip");
        assert_eq!(config.recent_files_capacity, 10);
        assert_eq!(config.output_extension, "pdf");
    }

    #[test]
    fn invalid_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_concurrent = \"many\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));
    }
}
