// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/output/json_output.rs - JSON 结果输出
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

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Render, Report},
  url_file_path,
};

const STDOUT_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum JsonOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonTarget {
  Stdout,
  File(PathBuf),
}

/// `json:-` 写到标准输出，`json:<路径>` 写到文件；`?pretty` 缩进输出
#[derive(Debug, Clone)]
pub struct JsonOutput {
  target: JsonTarget,
  pretty: bool,
}

impl FromUrlWithScheme for JsonOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonOutput {
  type Error = JsonOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(JsonOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let path = url_file_path(uri);
    let target = if path.is_empty() || path == STDOUT_PATH {
      JsonTarget::Stdout
    } else {
      JsonTarget::File(PathBuf::from(path))
    };
    let pretty = uri.query_pairs().any(|(k, _)| k == "pretty");

    Ok(JsonOutput { target, pretty })
  }
}

impl JsonOutput {
  pub fn stdout() -> Self {
    JsonOutput {
      target: JsonTarget::Stdout,
      pretty: false,
    }
  }

  pub fn file<P: Into<PathBuf>>(path: P) -> Self {
    JsonOutput {
      target: JsonTarget::File(path.into()),
      pretty: false,
    }
  }

  pub fn target(&self) -> &JsonTarget {
    &self.target
  }

  pub fn write_json<T: Serialize>(&self, value: &T) -> Result<(), JsonOutputError> {
    let mut text = if self.pretty {
      serde_json::to_string_pretty(value)?
    } else {
      serde_json::to_string(value)?
    };
    text.push('\n');

    match &self.target {
      JsonTarget::Stdout => {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
      }
      JsonTarget::File(path) => {
        if let Some(parent) = Path::new(path).parent()
          && !parent.as_os_str().is_empty()
        {
          std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        info!("保存结果到文件: {}", path.display());
      }
    }
    Ok(())
  }
}

/// JSON 只写结果，不使用帧
impl<F> Render<F, Report> for JsonOutput {
  type Error = JsonOutputError;

  fn render_result(&self, _frame: &F, result: &Report) -> Result<(), Self::Error> {
    self.write_json(result)
  }
}
