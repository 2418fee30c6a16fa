// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/nms.rs - 非极大值抑制
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

use tracing::debug;

use crate::pipeline::decode::{Detection, PixelBox};

/// 贪心非极大值抑制
///
/// 保留置信度高于分数阈值的候选，按置信度降序贪心选取，
/// 与已选框 IoU 超过阈值的未选框被剔除。同分按候选原序
/// 先到者胜，保证结果确定。返回保留候选在原列表中的下标，
/// 升序排列，候选属性不做任何改动。
pub fn suppress(detections: &[Detection], score_threshold: f32, iou_threshold: f32) -> Vec<usize> {
  let mut order: Vec<usize> = (0..detections.len())
    .filter(|&i| detections[i].confidence > score_threshold)
    .collect();

  // 稳定排序：同分保持原始顺序
  order.sort_by(|&a, &b| {
    detections[b]
      .confidence
      .partial_cmp(&detections[a].confidence)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  let mut retained = Vec::new();
  while let Some(best) = order.first().copied() {
    retained.push(best);
    order.retain(|&i| i != best && iou(&detections[best].bbox, &detections[i].bbox) <= iou_threshold);
  }

  retained.sort_unstable();
  debug!("NMS: {} 个候选保留 {} 个", detections.len(), retained.len());
  retained
}

/// 两框的交并比
pub fn iou(a: &PixelBox, b: &PixelBox) -> f32 {
  let x1 = a.x.max(b.x);
  let y1 = a.y.max(b.y);
  let x2 = (a.x + a.w).min(b.x + b.w);
  let y2 = (a.y + a.h).min(b.y + b.h);

  let intersection = ((x2 - x1).max(0) * (y2 - y1).max(0)) as f32;
  let union = (a.w * a.h + b.w * b.h) as f32 - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn det(x: i32, y: i32, w: i32, h: i32, confidence: f32) -> Detection {
    Detection {
      bbox: PixelBox { x, y, w, h },
      class_id: 0,
      confidence,
    }
  }

  #[test]
  fn empty_input_gives_empty_retained_set() {
    assert!(suppress(&[], 0.5, 0.4).is_empty());
  }

  #[test]
  fn overlapping_pair_keeps_higher_confidence() {
    // IoU = 70/130 ≈ 0.54 > 0.4
    let candidates = vec![det(0, 0, 10, 10, 0.6), det(0, 3, 10, 10, 0.9)];
    assert_eq!(suppress(&candidates, 0.5, 0.4), vec![1]);
  }

  #[test]
  fn disjoint_boxes_are_all_retained() {
    let candidates = vec![det(0, 0, 10, 10, 0.9), det(100, 100, 10, 10, 0.6)];
    assert_eq!(suppress(&candidates, 0.5, 0.4), vec![0, 1]);
  }

  #[test]
  fn scores_at_or_below_threshold_are_dropped() {
    let candidates = vec![det(0, 0, 10, 10, 0.5), det(100, 100, 10, 10, 0.51)];
    assert_eq!(suppress(&candidates, 0.5, 0.4), vec![1]);
  }

  #[test]
  fn confidence_tie_breaks_by_original_order() {
    // 完全重叠、同分：先出现的候选胜出
    let candidates = vec![det(0, 0, 10, 10, 0.8), det(0, 0, 10, 10, 0.8)];
    assert_eq!(suppress(&candidates, 0.5, 0.4), vec![0]);
  }

  #[test]
  fn iou_of_identical_boxes_is_one() {
    let b = PixelBox {
      x: 0,
      y: 0,
      w: 10,
      h: 10,
    };
    assert!((iou(&b, &b) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn iou_of_disjoint_boxes_is_zero() {
    let a = PixelBox {
      x: 0,
      y: 0,
      w: 10,
      h: 10,
    };
    let b = PixelBox {
      x: 20,
      y: 20,
      w: 10,
      h: 10,
    };
    assert_eq!(iou(&a, &b), 0.0);
  }

  #[test]
  fn heavy_overlap_collapses_to_single_detection() {
    // IoU = 0.7 的两个候选（0.6 / 0.9）只留下 0.9 的那个
    let candidates = vec![det(0, 0, 100, 70, 0.6), det(0, 0, 100, 100, 0.9)];
    assert!(iou(&candidates[0].bbox, &candidates[1].bbox) > 0.4);
    assert_eq!(suppress(&candidates, 0.5, 0.4), vec![1]);
  }
}
