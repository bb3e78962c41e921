use serde::Serialize;
use std::fmt;

/// 单个重型模块的加载状态
///
/// `Loaded` 之后不会再次加载；`Error` 不是缓存结果，下一次 `load()` 会重新拉取。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LibraryLoadState {
    #[serde(rename = "not-loaded")]
    Unloaded,
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "loaded")]
    Loaded,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for LibraryLoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LibraryLoadState::Unloaded => "not-loaded",
            LibraryLoadState::Loading => "loading",
            LibraryLoadState::Loaded => "loaded",
            LibraryLoadState::Error => "error",
        };
        f.write_str(label)
    }
}
