// 该文件是 Yaowang （遥望） 项目的一部分。
// src/config.rs - 流水线配置与部署档案
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

use clap::ValueEnum;
use thiserror::Error;
use tracing::info;

/// 原始帧（模型输入）发布频道
pub const RAW_TOPIC: &str = "/input_img";
/// 标注帧发布频道
pub const ANNOTATED_TOPIC: &str = "/adv_img";

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_NMS_SCORE_THRESHOLD: f32 = 0.5;
const DEFAULT_NMS_IOU_THRESHOLD: f32 = 0.4;
const DEFAULT_INPUT_WIDTH: u32 = 320;
const DEFAULT_INPUT_HEIGHT: u32 = 160;

/// 配置加载错误，启动阶段致命：进程在接收任何帧之前必须中止
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("无法读取类别文件 {path}: {source}")]
  LabelFile {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("类别文件为空: {0}")]
  EmptyLabels(PathBuf),
  #[error("检测器文件不存在: {0}")]
  MissingFile(PathBuf),
}

/// 部署档案，决定订阅的输入频道
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
  /// USB 摄像头
  Camera,
  /// Gazebo 仿真
  Gazebo,
  /// Turtlebot 机载摄像头
  Turtlebot,
}

impl Profile {
  /// 档案对应的固定输入频道名
  pub fn input_topic(&self) -> &'static str {
    match self {
      Profile::Camera => "/usb_cam/image_raw",
      Profile::Gazebo => "/camera/rgb/image_raw",
      Profile::Turtlebot => "/raspicam_node/image_raw",
    }
  }
}

/// 流水线静态配置，启动时建立一次，此后只读
#[derive(Debug, Clone)]
pub struct PipelineConfig {
  /// 解码阶段的置信度阈值
  pub confidence_threshold: f32,
  /// NMS 分数阈值
  pub nms_score_threshold: f32,
  /// NMS IOU 阈值
  pub nms_iou_threshold: f32,
  /// 网络输入宽度
  pub input_width: u32,
  /// 网络输入高度
  pub input_height: u32,
  /// 有序类别名列表，下标即 class_id
  pub labels: Box<[String]>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      nms_score_threshold: DEFAULT_NMS_SCORE_THRESHOLD,
      nms_iou_threshold: DEFAULT_NMS_IOU_THRESHOLD,
      input_width: DEFAULT_INPUT_WIDTH,
      input_height: DEFAULT_INPUT_HEIGHT,
      labels: Box::new([]),
    }
  }
}

impl PipelineConfig {
  pub fn with_labels(mut self, labels: Vec<String>) -> Self {
    self.labels = labels.into_boxed_slice();
    self
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_nms_thresholds(mut self, score: f32, iou: f32) -> Self {
    self.nms_score_threshold = score;
    self.nms_iou_threshold = iou;
    self
  }

  pub fn num_classes(&self) -> usize {
    self.labels.len()
  }

  pub fn label(&self, class_id: usize) -> Option<&str> {
    self.labels.get(class_id).map(String::as_str)
  }
}

/// 读取类别文件，每行一个类别名，行序即 class_id 含义
pub fn load_labels(path: &Path) -> Result<Vec<String>, ConfigError> {
  let text = std::fs::read_to_string(path).map_err(|source| ConfigError::LabelFile {
    path: path.to_path_buf(),
    source,
  })?;

  let labels: Vec<String> = text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect();

  if labels.is_empty() {
    return Err(ConfigError::EmptyLabels(path.to_path_buf()));
  }

  info!("类别文件加载完成，共 {} 个类别", labels.len());
  Ok(labels)
}

/// 检测器外部输入：网络结构描述文件与权重文件
///
/// 对流水线而言两者是不透明的，这里只在启动阶段校验存在性。
#[derive(Debug, Clone)]
pub struct DetectorFiles {
  pub descriptor: PathBuf,
  pub weights: PathBuf,
}

impl DetectorFiles {
  pub fn new(descriptor: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Self {
      descriptor: descriptor.into(),
      weights: weights.into(),
    }
  }

  pub fn check(&self) -> Result<(), ConfigError> {
    for path in [&self.descriptor, &self.weights] {
      if !path.is_file() {
        return Err(ConfigError::MissingFile(path.clone()));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn profile_maps_to_fixed_topic() {
    assert_eq!(Profile::Camera.input_topic(), "/usb_cam/image_raw");
    assert_eq!(Profile::Gazebo.input_topic(), "/camera/rgb/image_raw");
    assert_eq!(Profile::Turtlebot.input_topic(), "/raspicam_node/image_raw");
  }

  #[test]
  fn load_labels_keeps_line_order() {
    let path = temp_file("yaowang_labels_order.txt", "stop sign\nperson\ncar\n");
    let labels = load_labels(&path).unwrap();
    assert_eq!(labels, vec!["stop sign", "person", "car"]);
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn load_labels_rejects_empty_file() {
    let path = temp_file("yaowang_labels_empty.txt", "\n\n");
    assert!(matches!(load_labels(&path), Err(ConfigError::EmptyLabels(_))));
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn missing_label_file_is_fatal() {
    let path = std::env::temp_dir().join("yaowang_no_such_labels.txt");
    assert!(matches!(
      load_labels(&path),
      Err(ConfigError::LabelFile { .. })
    ));
  }

  #[test]
  fn detector_files_check_reports_missing() {
    let files = DetectorFiles::new("/no/such/model.cfg", "/no/such/model.weights");
    assert!(matches!(files.check(), Err(ConfigError::MissingFile(_))));
  }

  #[test]
  fn default_thresholds() {
    let config = PipelineConfig::default();
    assert_eq!(config.confidence_threshold, 0.5);
    assert_eq!(config.nms_score_threshold, 0.5);
    assert_eq!(config.nms_iou_threshold, 0.4);
    assert_eq!((config.input_width, config.input_height), (320, 160));
  }
}
