// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;

pub const DEFAULT_MODEL: &str = "fashionpedia:./models/fashionpedia_rcnn_R_101_FPN_3x.onnx";

/// Jinyi 服装检测与奢华度评估
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像（文件路径原样使用，或 image: URL）
  #[arg(value_name = "IMAGE")]
  pub image: String,

  /// 模型 URL，`labels` 参数指定标签文件，默认取模型同名的 .toml
  /// 例如: fashionpedia:./models/fp.onnx?labels=./labels/fashionpedia.toml
  #[arg(long, default_value = DEFAULT_MODEL, value_name = "MODEL")]
  pub model: String,

  /// 输出（可重复）
  /// 支持格式:
  /// - json:- 标准输出
  /// - json:<路径> JSON 文件，`?pretty` 缩进
  /// - image:<路径> 标注后的图像
  /// - <路径> JSON 文件
  #[arg(long, default_value = "json:-", value_name = "OUTPUT")]
  pub output: Vec<String>,

  /// 附带奢华度评估
  #[arg(long)]
  pub luxury: bool,

  /// 日志级别，日志写到标准错误
  #[arg(long, default_value = "warn", value_name = "LEVEL")]
  pub log_level: tracing::Level,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_positional_argument_is_enough() {
    let args = Args::try_parse_from(["jinyi", "coat.jpg"]).unwrap();
    assert_eq!(args.image, "coat.jpg");
    assert_eq!(args.model, DEFAULT_MODEL);
    assert_eq!(args.output, vec!["json:-"]);
    assert!(!args.luxury);
    assert_eq!(args.log_level, tracing::Level::WARN);
  }

  #[test]
  fn outputs_are_repeatable() {
    let args = Args::try_parse_from([
      "jinyi",
      "coat.jpg",
      "--output",
      "json:-",
      "--output",
      "image:out/coat.png",
      "--luxury",
      "--log-level",
      "debug",
    ])
    .unwrap();
    assert_eq!(args.output, vec!["json:-", "image:out/coat.png"]);
    assert!(args.luxury);
    assert_eq!(args.log_level, tracing::Level::DEBUG);
  }

  #[test]
  fn image_is_required() {
    assert!(Args::try_parse_from(["jinyi"]).is_err());
  }
}
