// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/mod.rs - 单帧处理流水线
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

mod annotate;
mod decode;
mod latency;
mod nms;
mod preprocess;

pub use annotate::{Annotator, percent_label};
pub use decode::{Detection, PixelBox, decode_outputs};
pub use latency::{LatencyMonitor, fps_from_ms};
pub use nms::{iou, suppress};
pub use preprocess::FramePreprocessor;

use thiserror::Error;
use tracing::{debug, info};

use crate::channel::TextSink;
use crate::config::PipelineConfig;
use crate::frame::BgrFrame;
use crate::model::{DetectorHandle, Engine};
use crate::output::{FramePublisher, PublishError, ViewSink};

/// 流水线错误
#[derive(Error, Debug)]
pub enum PipelineError {
  /// 推理引擎失败，按致命处理
  #[error("推理失败: {0}")]
  Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
  /// 帧编码/发布失败，属意外的环境问题，不静默吞掉
  #[error("发布失败: {0}")]
  Publish(#[from] PublishError),
}

/// 单帧处理报告，仅作诊断，不回馈控制流水线行为
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
  /// 解码出的候选数
  pub candidates: usize,
  /// NMS 后保留数
  pub retained: usize,
  /// 全程耗时（毫秒），含推理
  pub elapsed_ms: u128,
  /// 近似吞吐，耗时不足 1ms 时为 None
  pub fps: Option<f32>,
}

/// 单帧检测流水线
///
/// 整个流水线只有"正在处理一帧"一个状态；除静态配置与检测器
/// 句柄外，调用之间不携带任何状态。
pub struct Pipeline<E, S> {
  config: PipelineConfig,
  detector: DetectorHandle<E>,
  preprocessor: FramePreprocessor,
  annotator: Annotator,
  raw_publisher: FramePublisher<S>,
  annotated_publisher: FramePublisher<S>,
  view: Option<Box<dyn ViewSink>>,
}

impl<E: Engine, S: TextSink> Pipeline<E, S> {
  pub fn new(
    config: PipelineConfig,
    detector: DetectorHandle<E>,
    raw_publisher: FramePublisher<S>,
    annotated_publisher: FramePublisher<S>,
  ) -> Self {
    let preprocessor = FramePreprocessor::new(&config);
    Self {
      config,
      detector,
      preprocessor,
      annotator: Annotator::default(),
      raw_publisher,
      annotated_publisher,
      view: None,
    }
  }

  /// 挂接可选的交互显示出口
  pub fn with_view(mut self, view: Box<dyn ViewSink>) -> Self {
    self.view = Some(view);
    self
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// 处理一帧：预处理 → 发布原始帧 → 推理 → 解码 → NMS →
  /// 原地标注 → 发布标注帧 → 耗时上报
  ///
  /// 同步执行到完成，期间不接受下一帧；帧、张量与候选列表
  /// 都归本次调用独占。
  pub fn process_frame(&mut self, frame: &BgrFrame) -> Result<FrameReport, PipelineError> {
    let monitor = LatencyMonitor::start();

    let (mut resized, blob) = self.preprocessor.run(frame);

    // 先发布模型输入帧的快照，之后才在同一缓冲上标注
    self.raw_publisher.publish(&resized)?;

    let outputs = self
      .detector
      .forward(&blob)
      .map_err(|e| PipelineError::Engine(Box::new(e)))?;

    let candidates = decode_outputs(&outputs, &self.config);
    let retained = suppress(
      &candidates,
      self.config.nms_score_threshold,
      self.config.nms_iou_threshold,
    );

    self
      .annotator
      .annotate(&mut resized, &self.config, &candidates, &retained);

    if let Some(view) = self.view.as_mut() {
      view.show(&resized);
    }

    // 同一帧缓冲再次发布，即为标注版本
    self.annotated_publisher.publish(&resized)?;

    let elapsed_ms = monitor.elapsed_ms();
    let fps = fps_from_ms(elapsed_ms);
    match fps {
      Some(fps) => info!("fps: {:.2}", fps),
      None => debug!("耗时不足 1ms，跳过 fps 上报"),
    }

    Ok(FrameReport {
      candidates: candidates.len(),
      retained: retained.len(),
      elapsed_ms,
      fps,
    })
  }
}
