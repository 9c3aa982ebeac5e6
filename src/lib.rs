// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

pub mod frame;
pub mod input;
pub mod luxury;
pub mod model;
pub mod output;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 命令行中的位置：带方案的 URL，或原样使用的文件路径
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
  Url(url::Url),
  Path(PathBuf),
}

impl Location {
  /// 已存在的文件总按路径处理；否则带方案的参数视为 URL，其余视为路径。
  /// 路径不经过 URL 编码，`#`、`?`、`%` 都是文件名的一部分
  pub fn parse(value: &str) -> Self {
    if Path::new(value).exists() {
      return Location::Path(PathBuf::from(value));
    }
    match url::Url::parse(value) {
      // 单字母方案是 Windows 盘符，按路径处理
      Ok(url) if url.scheme().len() > 1 => Location::Url(url),
      _ => Location::Path(PathBuf::from(value)),
    }
  }
}

/// 既能由 URL 构造，也能直接由文件路径构造
pub trait FromPath: FromUrl {
  fn from_path(path: PathBuf) -> Result<Self, Self::Error>
  where
    Self: Sized;

  fn from_location(location: Location) -> Result<Self, Self::Error>
  where
    Self: Sized,
  {
    match location {
      Location::Url(url) => Self::from_url(&url),
      Location::Path(path) => Self::from_path(path),
    }
  }
}

/// 取出 URL 指向的文件路径，兼容 `scheme:relative/path` 与 `scheme:///abs/path`
pub fn url_file_path(url: &url::Url) -> String {
  urlencoding::decode(url.path())
    .map(|path| path.into_owned())
    .unwrap_or_else(|_| url.path().to_string())
}
