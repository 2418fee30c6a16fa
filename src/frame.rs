// 该文件是 Yaowang （遥望） 项目的一部分。
// src/frame.rs - BGR 帧定义
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

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

pub const BGR_CHANNELS: usize = 3;

/// 帧转换错误
///
/// 帧来源传入的原始字节无法按预期的像素排布解释时产生。
/// 该错误按帧恢复：记录日志并跳过当前帧，不影响后续帧。
#[derive(Error, Debug)]
pub enum FrameError {
  #[error("帧数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  Layout { expected: usize, actual: usize },
  #[error("帧尺寸无效: {0}x{1}")]
  EmptySize(u32, u32),
}

/// BGR 排列的 HWC 帧
///
/// 每次流水线调用独占一帧；帧与帧之间不共享缓冲。
#[derive(Debug, Clone)]
pub struct BgrFrame {
  data: Box<[u8]>,
  width: u32,
  height: u32,
}

impl BgrFrame {
  /// 从原始字节构造帧，长度必须为 宽 × 高 × 3
  pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
    if width == 0 || height == 0 {
      return Err(FrameError::EmptySize(width, height));
    }
    let expected = BGR_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      return Err(FrameError::Layout {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      width,
      height,
    })
  }

  /// 全黑帧
  pub fn black(width: u32, height: u32) -> Self {
    let size = BGR_CHANNELS * width as usize * height as usize;
    Self {
      data: vec![0u8; size].into_boxed_slice(),
      width,
      height,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    BGR_CHANNELS
  }

  pub fn as_bgr(&self) -> &[u8] {
    &self.data
  }

  pub fn as_bgr_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }

  /// 读取 (x, y) 处的 BGR 像素
  pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
    let idx = BGR_CHANNELS * (y as usize * self.width as usize + x as usize);
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  /// 写入 (x, y) 处的 BGR 像素
  pub fn put_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
    let idx = BGR_CHANNELS * (y as usize * self.width as usize + x as usize);
    self.data[idx..idx + 3].copy_from_slice(&bgr);
  }

  /// 以 image 缓冲视图借用帧数据，通道顺序仍为 BGR
  pub fn as_image(&self) -> ImageBuffer<Rgb<u8>, &[u8]> {
    ImageBuffer::from_raw(self.width, self.height, &*self.data).expect("帧缓冲长度与尺寸不符")
  }

  /// 以可变 image 缓冲视图借用帧数据，供绘制使用，通道顺序仍为 BGR
  pub fn as_image_mut(&mut self) -> ImageBuffer<Rgb<u8>, &mut [u8]> {
    ImageBuffer::from_raw(self.width, self.height, &mut *self.data).expect("帧缓冲长度与尺寸不符")
  }

  /// 交换 B/R 通道，得到发布用的 RGB 图像
  pub fn to_rgb_image(&self) -> RgbImage {
    ImageBuffer::from_fn(self.width, self.height, |x, y| {
      let [b, g, r] = self.pixel(x, y);
      Rgb([r, g, b])
    })
  }
}

/// 帧来源投递的原始图像消息
///
/// 传输层只保证携带字节与声称的尺寸，像素排布在流水线入口处校验。
#[derive(Debug, Clone)]
pub struct ImageMsg {
  pub data: Vec<u8>,
  pub width: u32,
  pub height: u32,
}

impl ImageMsg {
  pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
    Self {
      data,
      width,
      height,
    }
  }

  /// 按 BGR HWC 排布解释消息，失败即为帧转换错误
  pub fn into_frame(self) -> Result<BgrFrame, FrameError> {
    BgrFrame::from_raw(self.data, self.width, self.height)
  }
}

impl From<BgrFrame> for ImageMsg {
  fn from(frame: BgrFrame) -> Self {
    let width = frame.width();
    let height = frame.height();
    Self {
      data: frame.data.into_vec(),
      width,
      height,
    }
  }
}
