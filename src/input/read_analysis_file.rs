// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/input/read_analysis_file.rs - 分析结果输入
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
  fs::File,
  io::{BufReader, Read},
  path::PathBuf,
};

use thiserror::Error;
use tracing::debug;

use crate::model::Analysis;

const STDIN_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum ReadAnalysisError {
  #[error("无法读取分析结果 {0}: {1}")]
  IoError(String, #[source] std::io::Error),
  #[error("分析结果格式错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 分析结果来源：文件，省略或为 `-` 时为标准输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
  Stdin,
  File(PathBuf),
}

impl From<Option<PathBuf>> for AnalysisSource {
  fn from(path: Option<PathBuf>) -> Self {
    match path {
      Some(path) if path.as_os_str() != STDIN_PATH => AnalysisSource::File(path),
      _ => AnalysisSource::Stdin,
    }
  }
}

impl AnalysisSource {
  /// 读取分析结果；来源为标准输入时从 `stdin` 读取
  pub fn read_analysis<R: Read>(&self, stdin: R) -> Result<Analysis, ReadAnalysisError> {
    let analysis: Analysis = match self {
      AnalysisSource::Stdin => serde_json::from_reader(BufReader::new(stdin))?,
      AnalysisSource::File(path) => {
        let file = File::open(path)
          .map_err(|e| ReadAnalysisError::IoError(path.display().to_string(), e))?;
        serde_json::from_reader(BufReader::new(file))?
      }
    };
    debug!("读取到 {} 件服装", analysis.garments.len());
    Ok(analysis)
  }
}
