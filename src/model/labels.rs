// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/model/labels.rs - 类别与属性标签
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::frame::ChannelOrder;

const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("标签文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("标签文件格式错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("标签文件无效: {0}")]
  Invalid(String),
}

/// 模型输入与后处理参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelParams {
  pub input_width: u32,
  pub input_height: u32,
  pub channel_order: ChannelOrder,
  pub score_threshold: f32,
  pub mask_threshold: f32,
  pub attribute_threshold: f32,
}

impl Default for ModelParams {
  fn default() -> Self {
    Self {
      input_width: 1024,
      input_height: 1024,
      channel_order: ChannelOrder::Rgb,
      score_threshold: 0.5,
      mask_threshold: 0.5,
      attribute_threshold: 0.5,
    }
  }
}

/// 一组互斥的属性取值，例如 `collar_design`
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeGroup {
  pub name: String,
  pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FashionLabels {
  pub categories: Vec<String>,
  #[serde(default)]
  pub model: ModelParams,
  #[serde(default)]
  pub attributes: Vec<AttributeGroup>,
}

impl FashionLabels {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LabelError> {
    let path = path.as_ref();
    debug!("加载标签文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    text.parse()
  }

  pub fn category_name(&self, id: i64) -> &str {
    usize::try_from(id)
      .ok()
      .and_then(|id| self.categories.get(id))
      .map(String::as_str)
      .unwrap_or(UNKNOWN_CATEGORY)
  }

  /// 属性头的输出维度
  pub fn attribute_count(&self) -> usize {
    self.attributes.iter().map(|g| g.values.len()).sum()
  }

  /// 展平后的 `(属性名, 取值)`，下标即属性头的输出下标
  pub fn attribute_names(&self) -> Vec<(&str, &str)> {
    self
      .attributes
      .iter()
      .flat_map(|g| g.values.iter().map(|v| (g.name.as_str(), v.as_str())))
      .collect()
  }

  fn validate(self) -> Result<Self, LabelError> {
    if self.categories.is_empty() {
      return Err(LabelError::Invalid("类别列表为空".to_string()));
    }
    if self.model.input_width == 0 || self.model.input_height == 0 {
      return Err(LabelError::Invalid(format!(
        "模型输入尺寸无效: {}x{}",
        self.model.input_width, self.model.input_height
      )));
    }
    if let Some(group) = self.attributes.iter().find(|g| g.values.is_empty()) {
      return Err(LabelError::Invalid(format!("属性 {} 没有取值", group.name)));
    }
    Ok(self)
  }
}

impl std::str::FromStr for FashionLabels {
  type Err = LabelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let labels: FashionLabels = toml::from_str(s)?;
    labels.validate()
  }
}
