// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/output/annotated_image.rs - 检测结果可视化并保存
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{ImageFileInputError, read_rgb_image},
  model::Garment,
  output::{Render, Report},
  url_file_path,
};

// 每件服装轮换使用的颜色
const PALETTE: [[u8; 3]; 6] = [
  [230, 25, 75],
  [60, 180, 75],
  [0, 130, 200],
  [245, 130, 48],
  [145, 30, 180],
  [70, 240, 240],
];
const MASK_ALPHA: f32 = 0.4;
const BOX_THICKNESS: u32 = 2;

#[derive(Error, Debug)]
pub enum AnnotatedImageError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("源图像读取错误: {0}")]
  SourceError(#[from] ImageFileInputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 把掩码与边框画在原图上，保存到 `image:<路径>`
pub struct AnnotatedImageOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for AnnotatedImageOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for AnnotatedImageOutput {
  type Error = AnnotatedImageError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(AnnotatedImageError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(AnnotatedImageOutput {
      path: PathBuf::from(url_file_path(uri)),
    })
  }
}

impl AnnotatedImageOutput {
  fn save_image(&self, image: &RgbImage) -> Result<(), AnnotatedImageError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    image.save(&self.path)?;

    warn!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

pub fn draw_garments(image: &mut RgbImage, garments: &[Garment]) {
  for (i, garment) in garments.iter().enumerate() {
    let color = PALETTE[i % PALETTE.len()];
    overlay_mask(image, &garment.mask, color);
    draw_bbox(image, &garment.bbox, color);
  }
}

fn overlay_mask(image: &mut RgbImage, mask: &[Vec<u8>], color: [u8; 3]) {
  for (y, row) in mask.iter().enumerate().take(image.height() as usize) {
    for (x, &on) in row.iter().enumerate().take(image.width() as usize) {
      if on == 0 {
        continue;
      }
      let pixel = image.get_pixel_mut(x as u32, y as u32);
      for c in 0..3 {
        let blended = pixel[c] as f32 * (1.0 - MASK_ALPHA) + color[c] as f32 * MASK_ALPHA;
        pixel[c] = blended.round() as u8;
      }
    }
  }
}

// bbox 为原图像素坐标 [x_min, y_min, x_max, y_max]
fn draw_bbox(image: &mut RgbImage, bbox: &[f32; 4], color: [u8; 3]) {
  let (w, h) = (image.width() as i32, image.height() as i32);
  if w == 0 || h == 0 {
    return;
  }

  let x_min = (bbox[0].floor() as i32).clamp(0, w - 1);
  let y_min = (bbox[1].floor() as i32).clamp(0, h - 1);
  let x_max = (bbox[2].ceil() as i32).clamp(0, w - 1);
  let y_max = (bbox[3].ceil() as i32).clamp(0, h - 1);

  if x_min >= x_max || y_min >= y_max {
    return;
  }

  // 边框加粗，逐层内缩
  for t in 0..BOX_THICKNESS as i32 {
    let width = x_max - x_min - 2 * t + 1;
    let height = y_max - y_min - 2 * t + 1;
    if width <= 0 || height <= 0 {
      break;
    }
    let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
    draw_hollow_rect_mut(image, rect, Rgb(color));
  }
}

/// 帧为源图像文件路径，重新读取原图后标注
impl<P: AsRef<Path>> Render<P, Report> for AnnotatedImageOutput {
  type Error = AnnotatedImageError;

  fn render_result(&self, frame: &P, result: &Report) -> Result<(), Self::Error> {
    let mut image = read_rgb_image(frame)?;
    draw_garments(&mut image, &result.analysis.garments);
    self.save_image(&image)
  }
}
