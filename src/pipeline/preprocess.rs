// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/preprocess.rs - 帧预处理
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

use image::imageops::{self, FilterType};

use crate::config::PipelineConfig;
use crate::frame::{BGR_CHANNELS, BgrFrame};
use crate::model::Blob;

/// 帧预处理器：缩放到网络输入尺寸并构造归一化张量
pub struct FramePreprocessor {
  width: u32,
  height: u32,
}

impl FramePreprocessor {
  pub fn new(config: &PipelineConfig) -> Self {
    Self {
      width: config.input_width,
      height: config.input_height,
    }
  }

  /// 缩放到网络输入尺寸
  ///
  /// 重采样逐通道进行，与通道顺序无关，输出仍为 BGR。
  pub fn resize(&self, frame: &BgrFrame) -> BgrFrame {
    if frame.width() == self.width && frame.height() == self.height {
      return frame.clone();
    }

    let resized = imageops::resize(
      &frame.as_image(),
      self.width,
      self.height,
      FilterType::Triangle,
    );
    BgrFrame::from_raw(resized.into_raw(), self.width, self.height).expect("缩放输出长度不符")
  }

  /// 构造归一化张量：像素按 1/255 缩放，不减均值，不换通道，NCHW 排列
  pub fn make_blob(&self, frame: &BgrFrame) -> Blob {
    let width = frame.width();
    let height = frame.height();
    let spatial = width as usize * height as usize;
    let bgr = frame.as_bgr();

    let mut data = vec![0f32; BGR_CHANNELS * spatial];
    for idx in 0..spatial {
      for c in 0..BGR_CHANNELS {
        data[c * spatial + idx] = bgr[idx * BGR_CHANNELS + c] as f32 / 255.0;
      }
    }

    Blob::new(data, width, height)
  }

  /// 完整预处理：缩放后的帧留作发布与标注，张量供推理消费一次
  pub fn run(&self, frame: &BgrFrame) -> (BgrFrame, Blob) {
    let resized = self.resize(frame);
    let blob = self.make_blob(&resized);
    (resized, blob)
  }
}
