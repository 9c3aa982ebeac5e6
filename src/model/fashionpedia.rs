// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/model/fashionpedia.rs - Fashionpedia 模型定义
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

use image::{GrayImage, Luma, RgbImage, imageops::FilterType};
use indexmap::IndexMap;
use ndarray::Array4;
use ort::{
  session::{Session, builder::GraphOptimizationLevel},
  value::{DynValue, Tensor},
};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromPath, FromUrl, FromUrlWithScheme,
  frame::RgbNchwFrame,
  input::{ImageFileInputError, read_rgb_image},
  model::{Analysis, AttributeReading, FashionLabels, Garment, LabelError, Model},
  url_file_path,
};

const FASHIONPEDIA_NUM_INPUTS: usize = 1;
const OUTPUT_BOXES: &str = "boxes";
const OUTPUT_LABELS: &str = "labels";
const OUTPUT_SCORES: &str = "scores";
const OUTPUT_MASKS: &str = "masks";
const OUTPUT_ATTRIBUTE_SCORES: &str = "attribute_scores";
const FASHIONPEDIA_OUTPUTS: [&str; 5] = [
  OUTPUT_BOXES,
  OUTPUT_LABELS,
  OUTPUT_SCORES,
  OUTPUT_MASKS,
  OUTPUT_ATTRIBUTE_SCORES,
];

#[derive(Error, Debug)]
pub enum FashionpediaError {
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("标签错误: {0}")]
  LabelError(#[from] LabelError),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(String),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("模型缺少输出: {0}")]
  MissingOutput(String),
  #[error("输出形状不匹配: {0}")]
  ShapeMismatch(String),
  #[error("图像读取错误: {0}")]
  ImageError(#[from] ImageFileInputError),
}

fn ort_error(err: impl std::fmt::Display) -> FashionpediaError {
  FashionpediaError::OrtError(err.to_string())
}

pub struct FashionpediaBuilder {
  model_path: PathBuf,
  labels_path: PathBuf,
}

impl FromUrlWithScheme for FashionpediaBuilder {
  const SCHEME: &'static str = "fashionpedia";
}

impl FromUrl for FashionpediaBuilder {
  type Error = FashionpediaError;

  /// `fashionpedia:<模型路径>[?labels=<标签路径>]`，默认标签文件与模型同名
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FashionpediaError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let model_path = PathBuf::from(url_file_path(url));
    if model_path.as_os_str().is_empty() {
      return Err(FashionpediaError::ModelPathError("模型路径为空".to_string()));
    }

    let labels_path = url
      .query_pairs()
      .find(|(k, _)| k == "labels")
      .map(|(_, v)| PathBuf::from(v.into_owned()))
      .unwrap_or_else(|| model_path.with_extension("toml"));

    Ok(FashionpediaBuilder {
      model_path,
      labels_path,
    })
  }
}

impl FromPath for FashionpediaBuilder {
  /// 纯路径直接作为模型路径，标签文件与模型同名
  fn from_path(model_path: PathBuf) -> Result<Self, Self::Error> {
    if model_path.as_os_str().is_empty() {
      return Err(FashionpediaError::ModelPathError("模型路径为空".to_string()));
    }
    let labels_path = model_path.with_extension("toml");
    Ok(FashionpediaBuilder {
      model_path,
      labels_path,
    })
  }
}

impl FashionpediaBuilder {
  pub fn model_path(&self) -> &Path {
    &self.model_path
  }

  pub fn labels_path(&self) -> &Path {
    &self.labels_path
  }

  pub fn build(self) -> Result<Fashionpedia, FashionpediaError> {
    let labels = FashionLabels::load(&self.labels_path)?;
    debug!(
      "类别数量: {}, 属性数量: {}",
      labels.categories.len(),
      labels.attribute_count()
    );

    info!("加载模型文件: {}", self.model_path.display());
    let session = Session::builder()
      .map_err(ort_error)?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(ort_error)?
      .commit_from_file(&self.model_path)
      .map_err(ort_error)?;
    info!("模型加载完成");

    if session.inputs.len() != FASHIONPEDIA_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        FASHIONPEDIA_NUM_INPUTS,
        session.inputs.len()
      );
      return Err(FashionpediaError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        FASHIONPEDIA_NUM_INPUTS,
        session.inputs.len()
      )));
    }

    for name in FASHIONPEDIA_OUTPUTS {
      if !session.outputs.iter().any(|o| o.name == name) {
        error!("模型缺少输出: {}", name);
        return Err(FashionpediaError::MissingOutput(name.to_string()));
      }
    }

    Ok(Fashionpedia { session, labels })
  }
}

/// 加载一次、可重复推理的 Fashionpedia 模型
pub struct Fashionpedia {
  session: Session,
  labels: FashionLabels,
}

impl Fashionpedia {
  /// 读取图像文件并分析其中的服装
  pub fn analyze_image<P: AsRef<Path>>(&mut self, path: P) -> Result<Analysis, FashionpediaError> {
    let image = read_rgb_image(path)?;
    self.analyze_rgb_image(&image)
  }

  fn analyze_rgb_image(&mut self, input: &RgbImage) -> Result<Analysis, FashionpediaError> {
    let params = &self.labels.model;
    let frame = RgbNchwFrame::from_rgb_image(
      input,
      params.input_width,
      params.input_height,
      params.channel_order,
    );

    // 设置输入
    debug!("设置模型输入: {:?}", frame.shape());
    let array = Array4::from_shape_vec(frame.shape(), frame.as_nchw().to_vec())
      .map_err(|e| FashionpediaError::ShapeMismatch(e.to_string()))?;
    let tensor = Tensor::from_array(array).map_err(ort_error)?;

    // 执行推理
    debug!("执行模型推理");
    let outputs = self
      .session
      .run(ort::inputs![tensor])
      .map_err(ort_error)?;

    // 获取输出
    debug!("获取模型输出");
    let (_, boxes) = extract_f32(outputs.get(OUTPUT_BOXES), OUTPUT_BOXES)?;
    let (_, scores) = extract_f32(outputs.get(OUTPUT_SCORES), OUTPUT_SCORES)?;
    let (mask_shape, masks) = extract_f32(outputs.get(OUTPUT_MASKS), OUTPUT_MASKS)?;
    let (_, attribute_scores) = extract_f32(
      outputs.get(OUTPUT_ATTRIBUTE_SCORES),
      OUTPUT_ATTRIBUTE_SCORES,
    )?;
    let labels = outputs
      .get(OUTPUT_LABELS)
      .ok_or_else(|| FashionpediaError::MissingOutput(OUTPUT_LABELS.to_string()))?
      .try_extract_tensor::<i64>()
      .map_err(ort_error)?
      .1
      .to_vec();

    // masks: [N, 1, h, w]
    let mask_size = match mask_shape.as_slice() {
      [.., h, w] => (*h, *w),
      _ => {
        return Err(FashionpediaError::ShapeMismatch(format!(
          "掩码形状无效: {:?}",
          mask_shape
        )));
      }
    };

    let raw = RawDetections {
      boxes,
      labels,
      scores,
      masks,
      mask_size,
      attribute_scores,
    };

    postprocess(
      &raw,
      &self.labels,
      (params.input_width, params.input_height),
      input.dimensions(),
    )
  }
}

/// 输入是图像文件路径
impl Model for Fashionpedia {
  type Input = PathBuf;
  type Output = Analysis;
  type Error = FashionpediaError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.analyze_image(input)
  }
}

fn extract_f32(
  value: Option<&DynValue>,
  name: &str,
) -> Result<(Vec<usize>, Vec<f32>), FashionpediaError> {
  let value = value.ok_or_else(|| FashionpediaError::MissingOutput(name.to_string()))?;
  let (shape, data) = value.try_extract_tensor::<f32>().map_err(ort_error)?;
  let shape = shape.iter().map(|&d| d.max(0) as usize).collect();
  Ok((shape, data.to_vec()))
}

/// 模型原始输出，已从推理会话中拷出
#[derive(Debug, Clone, Default)]
pub struct RawDetections {
  pub boxes: Vec<f32>, // N x [x_min, y_min, x_max, y_max]，模型输入坐标
  pub labels: Vec<i64>,
  pub scores: Vec<f32>,
  pub masks: Vec<f32>, // N x h x w 概率
  pub mask_size: (usize, usize),
  pub attribute_scores: Vec<f32>, // N x A
}

impl RawDetections {
  pub fn len(&self) -> usize {
    self.scores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  fn check(&self, attribute_count: usize) -> Result<(), FashionpediaError> {
    let n = self.len();
    let (mh, mw) = self.mask_size;
    let checks = [
      (OUTPUT_BOXES, self.boxes.len(), n * 4),
      (OUTPUT_LABELS, self.labels.len(), n),
      (OUTPUT_MASKS, self.masks.len(), n * mh * mw),
      (
        OUTPUT_ATTRIBUTE_SCORES,
        self.attribute_scores.len(),
        n * attribute_count,
      ),
    ];
    for (name, actual, expected) in checks {
      if actual != expected {
        error!("输出 {} 大小为 {}, 期望 {}", name, actual, expected);
        return Err(FashionpediaError::ShapeMismatch(format!(
          "{}: 实际 {}, 期望 {}",
          name, actual, expected
        )));
      }
    }
    Ok(())
  }
}

/// 把原始输出整理为分析结果，坐标与掩码换算回原图尺寸
pub fn postprocess(
  raw: &RawDetections,
  labels: &FashionLabels,
  input_size: (u32, u32),
  original_size: (u32, u32),
) -> Result<Analysis, FashionpediaError> {
  debug!("后处理模型输出");
  let attribute_names = labels.attribute_names();
  raw.check(attribute_names.len())?;

  let params = &labels.model;
  let scale_x = original_size.0 as f32 / input_size.0 as f32;
  let scale_y = original_size.1 as f32 / input_size.1 as f32;
  let (mh, mw) = raw.mask_size;

  let mut garments = Vec::new();
  for i in 0..raw.len() {
    let score = raw.scores[i];
    // NaN 分数同样丢弃
    if score.is_nan() || score < params.score_threshold {
      continue;
    }

    let b = &raw.boxes[i * 4..i * 4 + 4];
    let bbox = [
      (b[0] * scale_x).clamp(0.0, original_size.0 as f32),
      (b[1] * scale_y).clamp(0.0, original_size.1 as f32),
      (b[2] * scale_x).clamp(0.0, original_size.0 as f32),
      (b[3] * scale_y).clamp(0.0, original_size.1 as f32),
    ];

    let mask = resize_mask(
      &raw.masks[i * mh * mw..(i + 1) * mh * mw],
      (mh, mw),
      original_size,
      params.mask_threshold,
    );

    let a = attribute_names.len();
    let attributes = read_attributes(
      labels,
      &raw.attribute_scores[i * a..(i + 1) * a],
      params.attribute_threshold,
    );

    garments.push(Garment {
      category: labels.category_name(raw.labels[i]).to_string(),
      bbox,
      mask,
      attributes,
      confidence: score,
    });
  }

  debug!("检测到 {} 件服装", garments.len());
  Ok(Analysis::new(garments))
}

fn resize_mask(
  probs: &[f32],
  (mh, mw): (usize, usize),
  (width, height): (u32, u32),
  threshold: f32,
) -> Vec<Vec<u8>> {
  let binary = GrayImage::from_fn(mw as u32, mh as u32, |x, y| {
    let p = probs[(y as usize) * mw + (x as usize)];
    Luma([if p >= threshold { 255 } else { 0 }])
  });
  let resized = if (mw as u32, mh as u32) == (width, height) {
    binary
  } else {
    image::imageops::resize(&binary, width, height, FilterType::Nearest)
  };

  resized
    .rows()
    .map(|row| row.map(|p| u8::from(p[0] > 0)).collect())
    .collect()
}

/// 每个属性组取得分最高的取值，低于阈值的组不报告
fn read_attributes(
  labels: &FashionLabels,
  scores: &[f32],
  threshold: f32,
) -> IndexMap<String, AttributeReading> {
  let mut attributes = IndexMap::new();
  let mut offset = 0;
  for group in &labels.attributes {
    let group_scores = &scores[offset..offset + group.values.len()];
    offset += group.values.len();

    let best = group_scores
      .iter()
      .copied()
      .enumerate()
      .max_by(|(_, a), (_, b)| a.total_cmp(b));
    if let Some((idx, confidence)) = best
      && confidence >= threshold
    {
      attributes.insert(
        group.name.clone(),
        AttributeReading {
          value: group.values[idx].clone(),
          confidence,
        },
      );
    }
  }
  attributes
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Location;

  const LABELS: &str = r#"
categories = ["shirt, blouse", "jacket"]

[model]
input_width = 4
input_height = 4
score_threshold = 0.5
attribute_threshold = 0.6

[[attributes]]
name = "collar_design"
values = ["notched", "peak"]

[[attributes]]
name = "construction"
values = ["hand_finished", "machine_finished", "bonded"]
"#;

  fn labels() -> FashionLabels {
    LABELS.parse().unwrap()
  }

  /// 两个检测：第一个是外套，第二个低于检测阈值
  fn raw() -> RawDetections {
    let mut masks = vec![0.0; 2 * 2 * 2];
    masks[0] = 0.9; // 第一个检测左上角
    masks[3] = 0.7; // 第一个检测右下角
    RawDetections {
      boxes: vec![1.0, 1.0, 3.0, 4.0, 0.0, 0.0, 1.0, 1.0],
      labels: vec![1, 0],
      scores: vec![0.95, 0.3],
      masks,
      mask_size: (2, 2),
      attribute_scores: vec![
        0.2, 0.85, 0.4, 0.55, 0.1, // peak 报告；construction 最高 0.55 不报告
        0.9, 0.1, 0.9, 0.1, 0.1,
      ],
    }
  }

  #[test]
  fn drops_low_score_detections() {
    let analysis = postprocess(&raw(), &labels(), (4, 4), (8, 8)).unwrap();
    assert_eq!(analysis.garments.len(), 1);
    assert_eq!(analysis.garments[0].category, "jacket");
    assert_eq!(analysis.overall_confidence, Some(0.95));
  }

  #[test]
  fn boxes_are_scaled_to_original_image() {
    let analysis = postprocess(&raw(), &labels(), (4, 4), (8, 12)).unwrap();
    assert_eq!(analysis.garments[0].bbox, [2.0, 3.0, 6.0, 12.0]);
  }

  #[test]
  fn masks_are_binary_at_original_size() {
    let analysis = postprocess(&raw(), &labels(), (4, 4), (4, 6)).unwrap();
    let mask = &analysis.garments[0].mask;
    assert_eq!(mask.len(), 6);
    assert!(mask.iter().all(|row| row.len() == 4));
    assert_eq!(mask[0][0], 1);
    assert_eq!(mask[0][3], 0);
    assert_eq!(mask[5][3], 1);
    assert!(mask.iter().flatten().all(|&p| p <= 1));
  }

  #[test]
  fn attributes_take_best_value_above_threshold() {
    let analysis = postprocess(&raw(), &labels(), (4, 4), (4, 4)).unwrap();
    let attributes = &analysis.garments[0].attributes;
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes["collar_design"].value, "peak");
    assert_eq!(attributes["collar_design"].confidence, 0.85);
    assert!(!attributes.contains_key("construction"));
  }

  #[test]
  fn empty_output_has_undefined_confidence() {
    let raw = RawDetections {
      mask_size: (2, 2),
      ..Default::default()
    };
    let analysis = postprocess(&raw, &labels(), (4, 4), (4, 4)).unwrap();
    assert!(analysis.garments.is_empty());
    assert_eq!(analysis.overall_confidence, None);
  }

  #[test]
  fn mismatched_attribute_columns_are_rejected() {
    let mut raw = raw();
    raw.attribute_scores.pop();
    assert!(matches!(
      postprocess(&raw, &labels(), (4, 4), (4, 4)),
      Err(FashionpediaError::ShapeMismatch(_))
    ));
  }

  #[test]
  fn nan_scores_are_dropped() {
    let mut raw = raw();
    raw.scores[0] = f32::NAN;
    let analysis = postprocess(&raw, &labels(), (4, 4), (4, 4)).unwrap();
    assert!(analysis.garments.is_empty());
    assert_eq!(analysis.overall_confidence, None);
  }

  #[test]
  fn builder_from_plain_path_keeps_file_name() {
    let builder = FashionpediaBuilder::from_location(Location::parse("./models/fp#2.onnx")).unwrap();
    assert_eq!(builder.model_path(), Path::new("./models/fp#2.onnx"));
    assert_eq!(builder.labels_path(), Path::new("./models/fp#2.toml"));
  }

  #[test]
  fn builder_from_url_defaults_labels_next_to_model() {
    let url = Url::parse("fashionpedia:./models/fp.onnx").unwrap();
    let builder = FashionpediaBuilder::from_url(&url).unwrap();
    assert_eq!(builder.model_path(), Path::new("./models/fp.onnx"));
    assert_eq!(builder.labels_path(), Path::new("./models/fp.toml"));
  }

  #[test]
  fn builder_from_url_reads_labels_query() {
    let url = Url::parse("fashionpedia:///opt/fp.onnx?labels=/etc/fp.toml").unwrap();
    let builder = FashionpediaBuilder::from_url(&url).unwrap();
    assert_eq!(builder.model_path(), Path::new("/opt/fp.onnx"));
    assert_eq!(builder.labels_path(), Path::new("/etc/fp.toml"));
  }

  #[test]
  fn builder_rejects_other_scheme() {
    let url = Url::parse("onnx:./m.onnx").unwrap();
    assert!(matches!(
      FashionpediaBuilder::from_url(&url),
      Err(FashionpediaError::ModelPathError(_))
    ));
  }

  #[test]
  fn missing_label_file_fails_before_loading_model() {
    let url = Url::parse("fashionpedia:/nonexistent/jinyi/fp.onnx").unwrap();
    let result = FashionpediaBuilder::from_url(&url).unwrap().build();
    assert!(matches!(result, Err(FashionpediaError::LabelError(_))));
  }
}
