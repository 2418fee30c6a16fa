// 该文件是 Yaowang （遥望） 项目的一部分。
// src/output.rs - 帧发布与可选显示出口
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

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::debug;

use crate::channel::TextSink;
use crate::frame::BgrFrame;

const DEFAULT_JPEG_QUALITY: u8 = 75;

/// 发布错误
///
/// 上游产出的帧总是良构的，编码失败属于环境/配置问题，不应吞掉。
#[derive(Error, Debug)]
pub enum PublishError {
  #[error("帧编码失败: {0}")]
  Encode(#[from] image::ImageError),
}

/// 帧发布器：BGR 转 RGB，JPEG 压缩，base64 编码后在命名频道上发出文本
pub struct FramePublisher<S> {
  sink: S,
  quality: u8,
}

impl<S: TextSink> FramePublisher<S> {
  pub fn new(sink: S) -> Self {
    Self {
      sink,
      quality: DEFAULT_JPEG_QUALITY,
    }
  }

  pub fn with_quality(mut self, quality: u8) -> Self {
    self.quality = quality.clamp(1, 100);
    self
  }

  pub fn topic(&self) -> &str {
    self.sink.topic()
  }

  /// 压缩一帧为 JPEG 字节
  pub fn encode(&self, frame: &BgrFrame) -> Result<Vec<u8>, PublishError> {
    let rgb = frame.to_rgb_image();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, self.quality).encode_image(&rgb)?;
    Ok(buffer)
  }

  /// 编码并发出一帧，发布即忘
  pub fn publish(&self, frame: &BgrFrame) -> Result<(), PublishError> {
    let jpeg = self.encode(frame)?;
    debug!(
      "频道 {} 发布 {}x{} 帧, JPEG {} 字节",
      self.sink.topic(),
      frame.width(),
      frame.height(),
      jpeg.len()
    );
    self.sink.emit(base64::encode(&jpeg));
    Ok(())
  }
}

/// 可选的交互显示出口
///
/// 作为可注入的能力由流水线在配置时挂接，与检测正确性正交。
pub trait ViewSink {
  fn show(&mut self, frame: &BgrFrame);
}

#[cfg(test)]
pub(crate) mod test_sink {
  use std::sync::Mutex;

  use crate::channel::TextSink;

  /// 捕获发布负载的测试槽
  pub struct CaptureSink {
    topic: String,
    pub payloads: Mutex<Vec<String>>,
  }

  impl CaptureSink {
    pub fn new(topic: &str) -> Self {
      Self {
        topic: topic.to_string(),
        payloads: Mutex::new(Vec::new()),
      }
    }

    pub fn last(&self) -> Option<String> {
      self.payloads.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
      self.payloads.lock().unwrap().len()
    }
  }

  impl TextSink for CaptureSink {
    fn topic(&self) -> &str {
      &self.topic
    }

    fn emit(&self, payload: String) {
      self.payloads.lock().unwrap().push(payload);
    }
  }

  impl TextSink for &CaptureSink {
    fn topic(&self) -> &str {
      &self.topic
    }

    fn emit(&self, payload: String) {
      self.payloads.lock().unwrap().push(payload);
    }
  }
}
