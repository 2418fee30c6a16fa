// 该文件是 Yaowang （遥望） 项目的一部分。
// src/task.rs - 连续检测任务
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

use std::{thread, time::Duration};

use tracing::{error, info, warn};

use crate::channel::{FrameReceiver, TextSink};
use crate::model::Engine;
use crate::pipeline::Pipeline;

/// 连续检测任务：单消费者从有界频道取帧，逐帧跑完整条流水线
///
/// 一帧处理完成（或失败）之前不取下一帧，各阶段不跨帧重叠。
#[derive(Debug)]
pub struct DetectLoop {
  frame_number: Option<usize>,
  handle_interrupt: bool,
}

impl Default for DetectLoop {
  fn default() -> Self {
    Self::new()
  }
}

impl DetectLoop {
  pub fn new() -> Self {
    Self {
      frame_number: None,
      handle_interrupt: true,
    }
  }

  /// 处理指定帧数后退出，None 表示不限
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 是否挂接 Ctrl-C 处理（测试中关闭）
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }

  pub fn run<E: Engine, S: TextSink>(
    self,
    input: FrameReceiver,
    pipeline: &mut Pipeline<E, S>,
  ) -> anyhow::Result<()> {
    info!("开始任务，订阅频道 {} ...", input.topic());
    let (tx, rx) = std::sync::mpsc::channel();

    if self.handle_interrupt {
      let result = ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      });
      if let Err(e) = result {
        warn!("无法挂接中断处理: {}", e);
      }
    }

    let mut frame_index = 0usize;
    while let Some(msg) = input.next_msg() {
      frame_index = (frame_index + 1) % usize::MAX;
      info!("处理第 {} 帧图像", frame_index);

      // 帧转换失败按帧恢复：记录并跳过，流水线保持可用
      let frame = match msg.into_frame() {
        Ok(frame) => frame,
        Err(e) => {
          error!("帧转换失败，跳过本帧: {}", e);
          continue;
        }
      };

      let report = pipeline.process_frame(&frame)?;
      info!(
        "第 {} 帧完成: 候选 {} 保留 {}, 耗时 {} ms",
        frame_index, report.candidates, report.retained, report.elapsed_ms
      );

      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}
