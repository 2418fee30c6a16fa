// 该文件是 Yaowang （遥望） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use yaowang::channel::frame_channel;
use yaowang::config::{ANNOTATED_TOPIC, DetectorFiles, PipelineConfig, RAW_TOPIC, load_labels};
use yaowang::model::{DetectorHandle, NullEngine};
use yaowang::output::FramePublisher;
use yaowang::pipeline::Pipeline;
use yaowang::task::DetectLoop;

// YOLOv3 网络的检测输出层
const OUTPUT_LAYERS: [&str; 3] = ["yolo_82", "yolo_94", "yolo_106"];

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("部署环境: {:?}", args.env);
  info!("网络描述文件: {}", args.cfg.display());
  info!("权重文件: {}", args.weights.display());
  info!("类别文件: {}", args.classes.display());
  info!("置信度阈值: {}", args.confidence);
  info!("NMS 阈值: {} / {}", args.nms_score, args.nms_iou);

  // 配置加载失败是致命的：在接收任何帧之前中止
  DetectorFiles::new(&args.cfg, &args.weights).check()?;
  let labels = load_labels(&args.classes)?;

  let config = PipelineConfig::default()
    .with_labels(labels)
    .with_confidence_threshold(args.confidence)
    .with_nms_thresholds(args.nms_score, args.nms_iou);

  let detector = DetectorHandle::new(
    NullEngine,
    OUTPUT_LAYERS.iter().map(|s| s.to_string()).collect(),
  );
  warn!("当前构建未接入推理后端，使用空引擎占位");

  let (raw_tx, _raw_rx) = yaowang::channel::text_channel(RAW_TOPIC, args.queue_depth);
  let (adv_tx, _adv_rx) = yaowang::channel::text_channel(ANNOTATED_TOPIC, args.queue_depth);
  let mut pipeline = Pipeline::new(
    config,
    detector,
    FramePublisher::new(raw_tx),
    FramePublisher::new(adv_tx),
  );

  let input_topic = args.env.input_topic();
  let (delivery, input) = frame_channel(input_topic, args.queue_depth);
  info!("等待频道 {} 投递帧 ...", input_topic);
  // 帧来源适配器持有 delivery 端，把传输层消息逐帧投入频道
  let _delivery = delivery;

  DetectLoop::new()
    .with_frame_number(args.frame_number)
    .run(input, &mut pipeline)?;

  Ok(())
}
