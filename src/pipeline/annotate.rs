// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/annotate.rs - 检测结果标注
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

use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::frame::BgrFrame;
use crate::pipeline::decode::Detection;

// 标注颜色为蓝色，帧为 BGR 排列，蓝色写作 [255, 0, 0]
const BOX_COLOR: [u8; 3] = [255, 0, 0];
const GLYPH_WIDTH: i32 = 6;
const GLYPH_HEIGHT: i32 = 8;

/// 标注器：在缩放后的帧上原地绘制保留的检测
///
/// 该帧已作为模型输入图像发布过一次，标注后再次发布即得到
/// 标注版本，不分配新缓冲。
pub struct Annotator {
  color: [u8; 3],
}

impl Default for Annotator {
  fn default() -> Self {
    Self { color: BOX_COLOR }
  }
}

impl Annotator {
  /// 为每个保留的检测画出矩形边框与 `<label>=<置信度百分比>%` 文本
  ///
  /// 不向帧边界裁剪：部分越界的框只画落在画布内的部分。
  pub fn annotate(
    &self,
    frame: &mut BgrFrame,
    config: &PipelineConfig,
    candidates: &[Detection],
    retained: &[usize],
  ) {
    for &idx in retained {
      let det = &candidates[idx];
      let Some(name) = config.label(det.class_id) else {
        // 解码阶段已过滤非法类别下标，这里只是兜底
        continue;
      };

      self.draw_box(frame, det);

      let label = format!("{}={}%", name, percent_label(det.confidence));
      debug!(
        "标注 {} @ ({}, {}) {}x{}",
        label, det.bbox.x, det.bbox.y, det.bbox.w, det.bbox.h
      );
      let text_y = (det.bbox.y - GLYPH_HEIGHT).max(0);
      draw_label(frame, det.bbox.x, text_y, &label, self.color);
    }
  }

  /// 两像素粗的空心矩形，外框加内缩一像素的第二道框
  fn draw_box(&self, frame: &mut BgrFrame, det: &Detection) {
    if det.bbox.w <= 0 || det.bbox.h <= 0 {
      return;
    }

    let mut canvas = frame.as_image_mut();
    let outer = Rect::at(det.bbox.x, det.bbox.y).of_size(det.bbox.w as u32, det.bbox.h as u32);
    draw_hollow_rect_mut(&mut canvas, outer, Rgb(self.color));

    if det.bbox.w > 2 && det.bbox.h > 2 {
      let inner = Rect::at(det.bbox.x + 1, det.bbox.y + 1)
        .of_size(det.bbox.w as u32 - 2, det.bbox.h as u32 - 2);
      draw_hollow_rect_mut(&mut canvas, inner, Rgb(self.color));
    }
  }
}

/// 置信度百分比文本，最多两位小数、至少一位（0.9 → "90.0"）
pub fn percent_label(confidence: f32) -> String {
  let mut text = format!("{:.2}", confidence * 100.0);
  while text.ends_with('0') && !text.ends_with(".0") {
    text.pop();
  }
  text
}

/// 用内嵌 5x7 点阵字模绘制文本，字模只有大写，小写先转换
fn draw_label(frame: &mut BgrFrame, x: i32, y: i32, text: &str, color: [u8; 3]) {
  let width = frame.width() as i32;
  let height = frame.height() as i32;
  let mut pen_x = x;

  for ch in text.chars().flat_map(|c| c.to_uppercase()) {
    if let Some(glyph) = glyph_bits(ch) {
      for (row, pattern) in glyph.iter().enumerate() {
        let py = y + row as i32;
        if py < 0 || py >= height {
          continue;
        }
        for col in 0..5 {
          if (pattern >> (4 - col)) & 1 == 1 {
            let px = pen_x + col;
            if px >= 0 && px < width {
              frame.put_pixel(px as u32, py as u32, color);
            }
          }
        }
      }
    }
    pen_x += GLYPH_WIDTH;
  }
}

/// 5 位宽、7 行高的字模
fn glyph_bits(ch: char) -> Option<[u8; 7]> {
  #[rustfmt::skip]
  let bits = match ch {
    'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
    'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
    'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
    'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
    'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
    'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
    'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
    'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
    'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
    'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
    'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
    'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
    'N' => [0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001],
    'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
    'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
    'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
    'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
    'S' => [0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110],
    'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
    'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
    'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
    'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
    'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
    'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
    'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
    '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
    '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
    '=' => [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000],
    '%' => [0b10001, 0b10010, 0b00100, 0b01000, 0b10010, 0b10001, 0b00000],
    '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
    '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
    '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110],
    ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
    _ => return None,
  };
  Some(bits)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pipeline::decode::PixelBox;

  fn config() -> PipelineConfig {
    PipelineConfig::default().with_labels(vec!["stop sign".into()])
  }

  fn detection(x: i32, y: i32, w: i32, h: i32, confidence: f32) -> Detection {
    Detection {
      bbox: PixelBox { x, y, w, h },
      class_id: 0,
      confidence,
    }
  }

  #[test]
  fn percent_label_matches_reference_rendering() {
    assert_eq!(percent_label(0.9), "90.0");
    assert_eq!(percent_label(1.0), "100.0");
    assert_eq!(percent_label(0.75), "75.0");
    assert_eq!(percent_label(0.882), "88.2");
    assert_eq!(percent_label(0.8825), "88.25");
  }

  #[test]
  fn empty_retained_set_leaves_frame_unmodified() {
    let mut frame = BgrFrame::black(320, 160);
    let before = frame.as_bgr().to_vec();
    Annotator::default().annotate(&mut frame, &config(), &[], &[]);
    assert_eq!(frame.as_bgr(), &before[..]);
  }

  #[test]
  fn rectangle_is_drawn_at_detection_box() {
    let mut frame = BgrFrame::black(320, 160);
    let candidates = vec![detection(140, 70, 40, 20, 0.9)];
    Annotator::default().annotate(&mut frame, &config(), &candidates, &[0]);

    // 外框四角
    assert_eq!(frame.pixel(140, 70), BOX_COLOR);
    assert_eq!(frame.pixel(179, 70), BOX_COLOR);
    assert_eq!(frame.pixel(140, 89), BOX_COLOR);
    assert_eq!(frame.pixel(179, 89), BOX_COLOR);
    // 内框（第二像素厚度）
    assert_eq!(frame.pixel(141, 71), BOX_COLOR);
    // 框内部保持原样
    assert_eq!(frame.pixel(160, 80), [0, 0, 0]);
    assert_eq!(frame.pixel(142, 72), [0, 0, 0]);
  }

  #[test]
  fn label_text_is_rendered_above_box() {
    let mut frame = BgrFrame::black(320, 160);
    let candidates = vec![detection(140, 70, 40, 20, 0.9)];
    Annotator::default().annotate(&mut frame, &config(), &candidates, &[0]);

    // 文本行落在框上方的字模带内
    let band: usize = (62..69)
      .flat_map(|y| (140..320).map(move |x| (x, y)))
      .filter(|&(x, y)| frame.pixel(x, y) == BOX_COLOR)
      .count();
    assert!(band > 0, "框上方应有标签像素");
  }

  #[test]
  fn partially_out_of_canvas_box_draws_partially() {
    let mut frame = BgrFrame::black(320, 160);
    let candidates = vec![detection(-10, -5, 40, 20, 0.9)];
    Annotator::default().annotate(&mut frame, &config(), &candidates, &[0]);

    // 落在画布内的右下角仍被绘制
    assert_eq!(frame.pixel(29, 14), BOX_COLOR);
    assert_eq!(frame.pixel(300, 100), [0, 0, 0]);
  }

  #[test]
  fn glyph_set_covers_label_alphabet() {
    for ch in "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789=%-_. ".chars() {
      assert!(glyph_bits(ch).is_some(), "缺少字模: {ch}");
    }
    assert!(glyph_bits('你').is_none());
  }
}
