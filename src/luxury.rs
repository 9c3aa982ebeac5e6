// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/luxury.rs - 奢华度评估
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

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Analysis;

/// 参与评估的属性及其已知取值
pub const LUXURY_ATTRIBUTES: [(&str, &[&str]); 9] = [
  ("collar_design", &["notched", "peak", "shawl", "mandarin"]),
  (
    "button_material",
    &["horn", "mother_of_pearl", "metal", "fabric_covered"],
  ),
  (
    "construction",
    &["hand_finished", "machine_finished", "bonded"],
  ),
  ("fit_type", &["slim", "regular", "oversized", "tailored"]),
  (
    "fabric_weight",
    &["lightweight", "medium_weight", "heavy_weight"],
  ),
  ("texture", &["smooth", "textured", "embossed", "brushed"]),
  ("seam_type", &["flat_fell", "french", "overlocked", "pinked"]),
  ("lining_type", &["full_lined", "half_lined", "unlined"]),
  ("hardware_finish", &["polished", "brushed", "antique", "matte"]),
];

pub const HIGH_VALUE_INDICATORS: [&str; 6] = [
  "hand_finished",
  "horn",
  "peak",
  "tailored",
  "french",
  "full_lined",
];
pub const MEDIUM_VALUE_INDICATORS: [&str; 4] = ["notched", "metal", "slim", "flat_fell"];

/// 属性置信度必须严格大于该值才计分
pub const INDICATOR_CONFIDENCE_THRESHOLD: f32 = 0.8;
pub const HIGH_VALUE_POINTS: u32 = 20;
pub const MEDIUM_VALUE_POINTS: u32 = 10;
pub const MAX_LUXURY_SCORE: u32 = 100;

const ULTRA_LUXURY_MIN: u32 = 80;
const LUXURY_MIN: u32 = 60;
const PREMIUM_MIN: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
  Contemporary,
  Premium,
  Luxury,
  UltraLuxury,
}

impl QualityTier {
  pub fn as_str(&self) -> &'static str {
    match self {
      QualityTier::Contemporary => "contemporary",
      QualityTier::Premium => "premium",
      QualityTier::Luxury => "luxury",
      QualityTier::UltraLuxury => "ultra_luxury",
    }
  }
}

impl std::fmt::Display for QualityTier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuxuryAssessment {
  pub luxury_score: u32,
  pub luxury_indicators: Vec<String>,
  pub quality_tier: QualityTier,
}

pub fn is_luxury_attribute(name: &str) -> bool {
  LUXURY_ATTRIBUTES.iter().any(|(attr, _)| *attr == name)
}

/// 单个取值的分数，不在两张表中的取值不计分
pub fn indicator_points(value: &str) -> Option<u32> {
  if HIGH_VALUE_INDICATORS.contains(&value) {
    Some(HIGH_VALUE_POINTS)
  } else if MEDIUM_VALUE_INDICATORS.contains(&value) {
    Some(MEDIUM_VALUE_POINTS)
  } else {
    None
  }
}

pub fn clamp_score(score: u32) -> u32 {
  score.min(MAX_LUXURY_SCORE)
}

/// 分数到等级的阶梯函数，恰好落在阈值上的分数归入更高一级
pub fn determine_quality_tier(score: u32) -> QualityTier {
  if score >= ULTRA_LUXURY_MIN {
    QualityTier::UltraLuxury
  } else if score >= LUXURY_MIN {
    QualityTier::Luxury
  } else if score >= PREMIUM_MIN {
    QualityTier::Premium
  } else {
    QualityTier::Contemporary
  }
}

pub fn extract_luxury_indicators(analysis: &Analysis) -> LuxuryAssessment {
  let mut score = 0u32;
  let mut indicators = Vec::new();

  for garment in &analysis.garments {
    for (name, reading) in &garment.attributes {
      // NaN 置信度不计分
      if !is_luxury_attribute(name)
        || reading.confidence.is_nan()
        || reading.confidence <= INDICATOR_CONFIDENCE_THRESHOLD
      {
        continue;
      }
      if let Some(points) = indicator_points(&reading.value) {
        score = score.saturating_add(points);
        indicators.push(format!("{}: {}", name, reading.value));
      }
    }
  }

  debug!("奢华度原始分数: {}, 指标数量: {}", score, indicators.len());

  LuxuryAssessment {
    luxury_score: clamp_score(score),
    luxury_indicators: indicators,
    quality_tier: determine_quality_tier(score),
  }
}
