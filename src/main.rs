// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use jinyi::{
  FromPath, Location,
  input::InputWrapper,
  model::FashionpediaBuilder,
  output::OutputWrapper,
  task::{AnalyzeTask, Task},
};

fn main() -> Result<()> {
  let args = args::Args::parse();

  // 标准输出只留给 JSON 结果
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_max_level(args.log_level)
    .init();

  info!("模型: {}", args.model);
  info!("输入图像: {}", args.image);
  info!("输出: {:?}", args.output);

  // 纯路径原样使用，不经过 URL 编码
  let model = FashionpediaBuilder::from_location(Location::parse(&args.model))?.build()?;
  let input = InputWrapper::from_location(Location::parse(&args.image))?;

  let mut outputs = Vec::with_capacity(args.output.len());
  for output in &args.output {
    outputs.push(OutputWrapper::from_location(Location::parse(output))?);
  }

  AnalyzeTask::default()
    .with_luxury(args.luxury)
    .run_task(input, model, outputs)
}
