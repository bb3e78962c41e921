//! 压缩包导出 - 基础设施层
//!
//! 把若干 (文件名, 内容) 打包成一个 zip。

use std::io::{Cursor, Write};
use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;

static EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // 只去掉最后一段扩展名
    Regex::new(r"\.[^/.]+$").expect("static regex")
});

/// 生成 zip 压缩包
pub fn build_zip(entries: &[(String, Bytes)]) -> Result<Bytes, ExportError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    let cursor = writer.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}

/// 去掉扩展名并替换路径分隔符，得到可用于导出的文件名主干
pub fn file_stem(name: &str) -> String {
    let stem = EXTENSION_RE.replace(name, "");
    let stem = stem.replace(['/', '\\'], "_");
    if stem.is_empty() {
        "file".to_string()
    } else {
        stem
    }
}
