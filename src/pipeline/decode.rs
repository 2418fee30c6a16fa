// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/decode.rs - 原始输出解码
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

use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::model::RawOutput;

/// 像素空间边界框，左上角坐标加宽高
///
/// 解码阶段不裁剪，越界框是合法候选，绘制方在画布边界处截断。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
  pub x: i32,
  pub y: i32,
  pub w: i32,
  pub h: i32,
}

/// 一条候选检测：像素框、类别下标、置信度
#[derive(Debug, Clone)]
pub struct Detection {
  pub bbox: PixelBox,
  pub class_id: usize,
  pub confidence: f32,
}

/// 把所有输出层的原始行解码为候选检测
///
/// 每行取第 5 位之后的类别分数子向量，最大分即候选置信度；
/// 置信度不超过阈值的行丢弃。坐标按网络输入尺寸（即缩放后的帧）
/// 换算为像素并截断取整，左上角 = 中心 - 宽高的一半。
pub fn decode_outputs(outputs: &[RawOutput], config: &PipelineConfig) -> Vec<Detection> {
  let width = config.input_width as f32;
  let height = config.input_height as f32;
  let mut detections = Vec::new();

  for output in outputs {
    for row in output.rows() {
      let scores = &row[5..];
      if scores.is_empty() {
        continue;
      }

      let (class_id, confidence) = argmax(scores);
      if confidence <= config.confidence_threshold {
        continue;
      }

      if class_id >= config.num_classes() {
        // 类别下标越过类别表即视为非法输入，绝不用它做索引
        warn!(
          "类别下标 {} 超出类别表范围 (共 {} 类)，丢弃该行",
          class_id,
          config.num_classes()
        );
        continue;
      }

      let center_x = (row[0] * width).trunc() as i32;
      let center_y = (row[1] * height).trunc() as i32;
      let w = (row[2] * width).trunc() as i32;
      let h = (row[3] * height).trunc() as i32;
      let x = (center_x as f32 - w as f32 / 2.0).trunc() as i32;
      let y = (center_y as f32 - h as f32 / 2.0).trunc() as i32;

      detections.push(Detection {
        bbox: PixelBox { x, y, w, h },
        class_id,
        confidence,
      });
    }
  }

  debug!("解码得到 {} 个候选", detections.len());
  detections
}

/// 最大分及其下标，同分取先出现者
fn argmax(scores: &[f32]) -> (usize, f32) {
  let mut best_idx = 0usize;
  let mut best = scores[0];
  for (idx, &score) in scores.iter().enumerate().skip(1) {
    if score > best {
      best = score;
      best_idx = idx;
    }
  }
  (best_idx, best)
}
