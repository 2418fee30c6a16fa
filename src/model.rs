// 该文件是 Yaowang （遥望） 项目的一部分。
// src/model.rs - 推理引擎契约
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

use tracing::warn;

/// 归一化输入张量，NCHW 排列，像素已按 1/255 缩放，通道保持 B,G,R 顺序
///
/// 由一帧生成，供推理引擎消费一次后丢弃。
#[derive(Debug, Clone)]
pub struct Blob {
  data: Box<[f32]>,
  width: u32,
  height: u32,
}

impl Blob {
  pub fn new(data: Vec<f32>, width: u32, height: u32) -> Self {
    let expected = 3 * width as usize * height as usize;
    if data.len() != expected {
      panic!(
        "张量长度不匹配: 期望长度 {}, 实际长度 {}",
        expected,
        data.len()
      );
    }
    Self {
      data: data.into_boxed_slice(),
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

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

/// 单个输出层的原始张量
///
/// 每行编码 `[center_x, center_y, width, height, objectness, class_score_0..N]`，
/// 坐标为相对网络输入尺寸的归一化值。
#[derive(Debug, Clone)]
pub struct RawOutput {
  data: Box<[f32]>,
  row_len: usize,
}

impl RawOutput {
  /// 由扁平数据与行长构造，数据长度必须是行长的整数倍
  pub fn new(data: Vec<f32>, row_len: usize) -> Self {
    if row_len < 5 || data.len() % row_len != 0 {
      panic!(
        "输出张量形状无效: 数据长度 {}, 行长 {}",
        data.len(),
        row_len
      );
    }
    Self {
      data: data.into_boxed_slice(),
      row_len,
    }
  }

  pub fn empty(row_len: usize) -> Self {
    Self::new(Vec::new(), row_len)
  }

  pub fn num_rows(&self) -> usize {
    self.data.len() / self.row_len
  }

  pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
    self.data.chunks_exact(self.row_len)
  }
}

/// 推理引擎契约
///
/// 对流水线而言是不透明的纯函数调用：同一权重同一输入，输出确定。
/// 测试可用确定性的假引擎替换。
pub trait Engine {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 给定张量与有序输出层名，每个请求的层返回一个原始输出张量
  fn infer(&self, blob: &Blob, output_layers: &[String]) -> Result<Vec<RawOutput>, Self::Error>;
}

/// 已加载网络的引用加上输出层名簿记
///
/// 启动时创建一次，进程生命周期内只读。
pub struct DetectorHandle<E> {
  engine: E,
  output_layers: Box<[String]>,
}

impl<E: Engine> DetectorHandle<E> {
  pub fn new(engine: E, output_layers: Vec<String>) -> Self {
    Self {
      engine,
      output_layers: output_layers.into_boxed_slice(),
    }
  }

  pub fn output_layers(&self) -> &[String] {
    &self.output_layers
  }

  /// 执行一次前向推理
  pub fn forward(&self, blob: &Blob) -> Result<Vec<RawOutput>, E::Error> {
    self.engine.infer(blob, &self.output_layers)
  }
}

/// 空推理后端，占位用：每个输出层返回零行张量
///
/// 真实部署把具体后端接在 [`Engine`] 上即可，流水线不感知差异。
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEngine;

impl Engine for NullEngine {
  type Error = std::convert::Infallible;

  fn infer(&self, _blob: &Blob, output_layers: &[String]) -> Result<Vec<RawOutput>, Self::Error> {
    warn!("空推理后端：未执行实际推理");
    Ok(output_layers.iter().map(|_| RawOutput::empty(5)).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_output_rows_follow_row_len() {
    let out = RawOutput::new(vec![0.0; 14], 7);
    assert_eq!(out.num_rows(), 2);
    assert!(out.rows().all(|row| row.len() == 7));
  }

  #[test]
  #[should_panic]
  fn raw_output_rejects_ragged_data() {
    let _ = RawOutput::new(vec![0.0; 10], 7);
  }

  #[test]
  fn null_engine_yields_one_empty_tensor_per_layer() {
    let handle = DetectorHandle::new(
      NullEngine,
      vec!["yolo_82".to_string(), "yolo_94".to_string()],
    );
    let blob = Blob::new(vec![0.0; 3 * 4 * 2], 4, 2);
    let outputs = handle.forward(&blob).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|o| o.num_rows() == 0));
  }
}
