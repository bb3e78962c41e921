//! 错误类型
//!
//! 按子系统划分：存储 / 模块加载 / 导出 / 配置。
//! 单个条目的处理失败不属于这里，它被记录在 `BatchItem::error_message` 上。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 存储相关错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 模块加载错误
    #[error("模块加载错误: {0}")]
    Loader(#[from] LoaderError),
    /// 导出错误
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 嵌入式数据库错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 数据库不可用（打开失败 / 权限受限）
    #[error("数据库不可用: {0}")]
    Unavailable(String),
    /// SQLite 执行失败
    #[error("SQLite 错误: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// 记录序列化 / 反序列化失败
    #[error("记录序列化失败: {0}")]
    Serde(#[from] serde_json::Error),
    /// 记录缺少字符串类型的 `id`
    #[error("记录缺少 id 字段")]
    MissingId,
    /// 后台阻塞任务异常退出
    #[error("后台任务失败: {0}")]
    Task(String),
    /// 文件读写失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 模块加载错误
///
/// 需要 `Clone`：同一次加载的结果会分发给所有并发等待者。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// 未注册的模块或模块组
    #[error("未注册的模块: {0}")]
    UnknownModule(String),
    /// 拉取失败
    #[error("模块 {module} 加载失败: {message}")]
    FetchFailed { module: String, message: String },
}

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 压缩包生成失败
    #[error("压缩包生成失败: {0}")]
    Archive(#[from] zip::result::ZipError),
    /// 写入失败
    #[error("写入 {path} 失败: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl LoaderError {
    /// 创建拉取失败错误
    pub fn fetch_failed(module: impl Into<String>, message: impl Into<String>) -> Self {
        LoaderError::FetchFailed {
            module: module.into(),
            message: message.into(),
        }
    }
}

impl ExportError {
    /// 创建写入失败错误
    pub fn write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        ExportError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_error_message_names_module() {
        let err = LoaderError::fetch_failed("pdfjs", "network down");
        assert_eq!(err.to_string(), "模块 pdfjs 加载失败: network down");
    }

    #[test]
    fn store_error_converts_into_app_error() {
        let err: AppError = StoreError::MissingId.into();
        assert!(matches!(err, AppError::Store(StoreError::MissingId)));
    }
}
