// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/task.rs - 分析任务
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

use tracing::info;

use crate::{
  luxury::extract_luxury_indicators,
  model::{Analysis, Model},
  output::{Render, Report},
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 取第一帧推理一次，按需附带奢华度评估
#[derive(Default, Debug)]
pub struct AnalyzeTask {
  with_luxury: bool,
}

impl AnalyzeTask {
  pub fn with_luxury(mut self, with_luxury: bool) -> Self {
    self.with_luxury = with_luxury;
    self
  }

  pub fn report(&self, analysis: Analysis) -> Report {
    let luxury = self.with_luxury.then(|| {
      let assessment = extract_luxury_indicators(&analysis);
      info!(
        "奢华度: {} ({})",
        assessment.luxury_score, assessment.quality_tier
      );
      assessment
    });
    Report { analysis, luxury }
  }
}

impl<
  F,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = Analysis, Error = ME>,
  O: Render<F, Report, Error = RE>,
> Task<I, M, O> for AnalyzeTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, mut model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");
    let now = std::time::Instant::now();
    let analysis = model.infer(&frame)?;
    info!(
      "推理完成，检测到 {} 件服装，耗时: {:.2?}",
      analysis.garments.len(),
      now.elapsed()
    );
    let report = self.report(analysis);
    output.render_result(&frame, &report)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{AttributeReading, Garment};
  use indexmap::IndexMap;
  use std::cell::RefCell;
  use thiserror::Error;

  #[derive(Error, Debug)]
  #[error("mock error")]
  struct MockError;

  /// 固定返回一件带峰形领的外套
  struct MockModel;

  impl Model for MockModel {
    type Input = u8;
    type Output = Analysis;
    type Error = MockError;

    fn infer(&mut self, _input: &u8) -> Result<Analysis, MockError> {
      let mut attributes = IndexMap::new();
      attributes.insert(
        "collar_design".to_string(),
        AttributeReading {
          value: "peak".to_string(),
          confidence: 0.95,
        },
      );
      Ok(Analysis::new(vec![Garment {
        category: "coat".to_string(),
        bbox: [0.0, 0.0, 1.0, 1.0],
        mask: vec![],
        attributes,
        confidence: 0.9,
      }]))
    }
  }

  #[derive(Default)]
  struct Capture {
    reports: RefCell<Vec<Report>>,
  }

  impl Render<u8, Report> for &Capture {
    type Error = MockError;

    fn render_result(&self, _frame: &u8, result: &Report) -> Result<(), MockError> {
      self.reports.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  #[test]
  fn renders_analysis_without_luxury_by_default() {
    let capture = Capture::default();
    AnalyzeTask::default()
      .run_task(vec![1u8].into_iter(), MockModel, &capture)
      .unwrap();
    let reports = capture.reports.borrow();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].analysis.garments[0].category, "coat");
    assert!(reports[0].luxury.is_none());
  }

  #[test]
  fn embeds_luxury_when_requested() {
    let capture = Capture::default();
    AnalyzeTask::default()
      .with_luxury(true)
      .run_task(vec![1u8, 2u8].into_iter(), MockModel, &capture)
      .unwrap();
    let reports = capture.reports.borrow();
    // 只处理第一帧
    assert_eq!(reports.len(), 1);
    let luxury = reports[0].luxury.as_ref().unwrap();
    assert_eq!(luxury.luxury_score, 20);
    assert_eq!(luxury.luxury_indicators, vec!["collar_design: peak"]);
  }

  #[test]
  fn empty_input_is_error() {
    let capture = Capture::default();
    let result = AnalyzeTask::default().run_task(
      std::iter::empty::<u8>(),
      MockModel,
      &capture,
    );
    assert!(result.is_err());
    assert!(capture.reports.borrow().is_empty());
  }
}
