// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/bin/luxury_score.rs - 对已有分析结果评估奢华度
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

use anyhow::Result;
use clap::Parser;
use tracing::info;

use jinyi::{input::AnalysisSource, luxury::extract_luxury_indicators, output::JsonOutput};

/// 读取 jinyi 输出的分析 JSON，输出奢华度评估
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分析结果文件，省略或为 `-` 时读取标准输入
  #[arg(value_name = "ANALYSIS")]
  pub analysis: Option<PathBuf>,

  /// 日志级别，日志写到标准错误
  #[arg(long, default_value = "warn", value_name = "LEVEL")]
  pub log_level: tracing::Level,
}

fn main() -> Result<()> {
  let args = Args::parse();

  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_max_level(args.log_level)
    .init();

  let analysis = AnalysisSource::from(args.analysis)
    .read_analysis(std::io::stdin().lock())?;
  info!("读取到 {} 件服装", analysis.garments.len());

  let assessment = extract_luxury_indicators(&analysis);
  info!(
    "奢华度: {} ({})",
    assessment.luxury_score, assessment.quality_tier
  );

  JsonOutput::stdout().write_json(&assessment)?;
  Ok(())
}
