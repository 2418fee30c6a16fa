// 该文件是 Yaowang （遥望） 项目的一部分。
// src/args.rs - 项目参数配置
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

use std::path::PathBuf;

use clap::Parser;

use yaowang::config::Profile;

/// Yaowang 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 部署环境，决定订阅的输入频道
  #[arg(long, value_enum, value_name = "ENV")]
  pub env: Profile,

  /// 网络结构描述文件
  #[arg(long, value_name = "FILE")]
  pub cfg: PathBuf,

  /// 权重文件
  #[arg(long, value_name = "FILE")]
  pub weights: PathBuf,

  /// 类别文件，每行一个类别名，行序即 class_id
  #[arg(long, value_name = "FILE")]
  pub classes: PathBuf,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS 分数阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub nms_score: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.4", value_name = "THRESHOLD")]
  pub nms_iou: f32,

  /// 输入频道队列深度
  #[arg(long, default_value = "10", value_name = "DEPTH")]
  pub queue_depth: usize,

  /// 最大处理帧数（不给出表示不限制）
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}
