// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/model.rs - 模型
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

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 细粒度属性的识别结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReading {
  pub value: String,
  pub confidence: f32,
}

/// 单件服装的检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garment {
  pub category: String,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，原图像素坐标
  /// 原图尺寸的二值掩码，按行存储
  #[serde(default)]
  pub mask: Vec<Vec<u8>>,
  pub attributes: IndexMap<String, AttributeReading>,
  pub confidence: f32,
}

/// 一张图像的分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
  pub garments: Vec<Garment>,
  /// 所有服装置信度的均值，没有服装时无定义
  pub overall_confidence: Option<f32>,
}

impl Analysis {
  pub fn new(garments: Vec<Garment>) -> Self {
    let overall_confidence = mean_confidence(&garments);
    if overall_confidence.is_none() {
      warn!("未检测到服装，整体置信度无定义");
    }
    Analysis {
      garments,
      overall_confidence,
    }
  }
}

fn mean_confidence(garments: &[Garment]) -> Option<f32> {
  if garments.is_empty() {
    return None;
  }
  let sum: f32 = garments.iter().map(|g| g.confidence).sum();
  Some(sum / garments.len() as f32)
}

mod labels;
pub use self::labels::{AttributeGroup, FashionLabels, LabelError, ModelParams};

mod fashionpedia;
pub use self::fashionpedia::{
  Fashionpedia, FashionpediaBuilder, FashionpediaError, RawDetections, postprocess,
};
