// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/output.rs - 输出定义
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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{FromPath, FromUrl, FromUrlWithScheme, luxury::LuxuryAssessment, model::Analysis};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

/// 一次分析的完整输出，奢华度评估按需附带
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
  #[serde(flatten)]
  pub analysis: Analysis,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub luxury: Option<LuxuryAssessment>,
}

mod json_output;
pub use self::json_output::{JsonOutput, JsonOutputError, JsonTarget};

#[cfg(feature = "annotated_image")]
mod annotated_image;
#[cfg(feature = "annotated_image")]
pub use self::annotated_image::{AnnotatedImageError, AnnotatedImageOutput};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("JSON 输出错误: {0}")]
  JsonOutputError(#[from] JsonOutputError),
  #[cfg(feature = "annotated_image")]
  #[error("标注图像输出错误: {0}")]
  AnnotatedImageError(#[from] AnnotatedImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  JsonOutput(JsonOutput),
  #[cfg(feature = "annotated_image")]
  AnnotatedImageOutput(AnnotatedImageOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      JsonOutput::SCHEME => Ok(OutputWrapper::JsonOutput(JsonOutput::from_url(url)?)),
      #[cfg(feature = "annotated_image")]
      AnnotatedImageOutput::SCHEME => Ok(OutputWrapper::AnnotatedImageOutput(
        AnnotatedImageOutput::from_url(url)?,
      )),
      scheme => Err(OutputError::SchemeMismatch(scheme.to_string())),
    }
  }
}

/// 纯路径写 JSON 文件
impl FromPath for OutputWrapper {
  fn from_path(path: PathBuf) -> Result<Self, Self::Error> {
    Ok(OutputWrapper::JsonOutput(JsonOutput::file(path)))
  }
}

/// 帧为源图像文件路径
impl Render<PathBuf, Report> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &PathBuf, result: &Report) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::JsonOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "annotated_image")]
      OutputWrapper::AnnotatedImageOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

/// 依次交给每个输出
impl<F, D, R: Render<F, D>> Render<F, D> for Vec<R> {
  type Error = R::Error;

  fn render_result(&self, frame: &F, result: &D) -> Result<(), Self::Error> {
    self
      .iter()
      .try_for_each(|output| output.render_result(frame, result))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::luxury::QualityTier;

  fn report(luxury: Option<LuxuryAssessment>) -> Report {
    Report {
      analysis: Analysis::new(vec![]),
      luxury,
    }
  }

  #[test]
  fn report_flattens_analysis() {
    let json = serde_json::to_value(report(None)).unwrap();
    assert!(json["garments"].as_array().unwrap().is_empty());
    assert!(json["overall_confidence"].is_null());
    assert!(json.get("luxury").is_none());
  }

  #[test]
  fn report_embeds_luxury_when_present() {
    let json = serde_json::to_value(report(Some(LuxuryAssessment {
      luxury_score: 40,
      luxury_indicators: vec!["collar_design: peak".to_string()],
      quality_tier: QualityTier::Premium,
    })))
    .unwrap();
    assert_eq!(json["luxury"]["luxury_score"], 40);
    assert_eq!(json["luxury"]["quality_tier"], "premium");
  }

  #[test]
  fn wrapper_dispatches_on_scheme() {
    let url = Url::parse("json:-").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::JsonOutput(_))
    ));

    let url = Url::parse("rtsp://localhost/stream").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn plain_output_path_is_a_json_file() {
    let location = crate::Location::parse("out/look#1.json");
    let Ok(OutputWrapper::JsonOutput(output)) = OutputWrapper::from_location(location) else {
      panic!("expected json output");
    };
    assert_eq!(
      output.target(),
      &JsonTarget::File(PathBuf::from("out/look#1.json"))
    );
  }

  #[cfg(feature = "annotated_image")]
  #[test]
  fn wrapper_builds_annotated_image_output() {
    let url = Url::parse("image:out/annotated.png").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::AnnotatedImageOutput(_))
    ));
  }
}
