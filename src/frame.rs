// 该文件是 Jinyi （锦衣） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use image::{RgbImage, imageops::FilterType};
use serde::Deserialize;

const RGB_CHANNELS: usize = 3;

/// 模型期望的颜色通道顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
  #[default]
  Rgb,
  Bgr,
}

impl ChannelOrder {
  /// 目标通道 `c` 对应的 RGB 源通道
  fn source_channel(self, c: usize) -> usize {
    match self {
      ChannelOrder::Rgb => c,
      ChannelOrder::Bgr => RGB_CHANNELS - 1 - c,
    }
  }
}

/// 归一化到 [0, 1] 的平面 NCHW 帧，N 固定为 1
#[derive(Debug, Clone)]
pub struct RgbNchwFrame {
  data: Box<[f32]>,
  height: usize,
  width: usize,
  order: ChannelOrder,
}

impl RgbNchwFrame {
  pub fn with_shape(height: usize, width: usize, order: ChannelOrder) -> Self {
    let data = vec![0f32; RGB_CHANNELS * height * width].into_boxed_slice();
    Self {
      data,
      height,
      width,
      order,
    }
  }

  /// 缩放到模型输入尺寸，并按模型的通道顺序重排
  pub fn from_rgb_image(image: &RgbImage, width: u32, height: u32, order: ChannelOrder) -> Self {
    let resized;
    let image = if image.dimensions() == (width, height) {
      image
    } else {
      resized = image::imageops::resize(image, width, height, FilterType::Triangle);
      &resized
    };

    let mut frame = Self::with_shape(height as usize, width as usize, order);
    let plane = frame.height * frame.width;
    let row = frame.width;
    let slice = frame.as_mut();

    for (x, y, pixel) in image.enumerate_pixels() {
      let idx = (y as usize) * row + (x as usize);
      for c in 0..RGB_CHANNELS {
        slice[c * plane + idx] = pixel[order.source_channel(c)] as f32 / 255.0;
      }
    }
    frame
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn channel_order(&self) -> ChannelOrder {
    self.order
  }

  /// 张量形状 `[1, C, H, W]`
  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.height, self.width]
  }

  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}

impl AsMut<[f32]> for RgbNchwFrame {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn red_blue_image() -> RgbImage {
    // 左红右蓝
    RgbImage::from_fn(2, 1, |x, _| {
      if x == 0 {
        Rgb([255, 0, 0])
      } else {
        Rgb([0, 0, 255])
      }
    })
  }

  #[test]
  fn rgb_frame_keeps_planes() {
    let frame = RgbNchwFrame::from_rgb_image(&red_blue_image(), 2, 1, ChannelOrder::Rgb);
    assert_eq!(frame.shape(), [1, 3, 1, 2]);
    // R 平面, G 平面, B 平面
    assert_eq!(frame.as_nchw(), &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
  }

  #[test]
  fn bgr_frame_swaps_red_and_blue() {
    let frame = RgbNchwFrame::from_rgb_image(&red_blue_image(), 2, 1, ChannelOrder::Bgr);
    assert_eq!(frame.channel_order(), ChannelOrder::Bgr);
    assert_eq!(frame.as_nchw(), &[0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
  }

  #[test]
  fn frame_is_resized_to_model_input() {
    let image = RgbImage::from_pixel(7, 5, Rgb([128, 128, 128]));
    let frame = RgbNchwFrame::from_rgb_image(&image, 4, 3, ChannelOrder::Rgb);
    assert_eq!((frame.height(), frame.width(), frame.channels()), (3, 4, 3));
    assert_eq!(frame.as_nchw().len(), 3 * 3 * 4);
    assert!(frame.as_nchw().iter().all(|v| (*v - 128.0 / 255.0).abs() < 1e-3));
  }
}
