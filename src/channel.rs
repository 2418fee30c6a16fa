// 该文件是 Yaowang （遥望） 项目的一部分。
// src/channel.rs - 有界帧投递与文本发布频道
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

use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use tracing::warn;

use crate::frame::ImageMsg;

/// 频道默认队列深度
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

/// 帧投递发送端
///
/// 队列满时丢弃新到的帧（drop-newest），流水线侧不做任何缓冲。
pub struct FrameSender {
  topic: String,
  tx: SyncSender<ImageMsg>,
}

impl FrameSender {
  pub fn topic(&self) -> &str {
    &self.topic
  }

  /// 尝试投递一帧，队列满或消费端退出时丢弃并返回 false
  pub fn offer(&self, msg: ImageMsg) -> bool {
    match self.tx.try_send(msg) {
      Ok(()) => true,
      Err(TrySendError::Full(_)) => {
        warn!("频道 {} 队列已满，丢弃新帧", self.topic);
        false
      }
      Err(TrySendError::Disconnected(_)) => {
        warn!("频道 {} 消费端已退出，丢弃帧", self.topic);
        false
      }
    }
  }
}

/// 帧投递接收端，流水线消费任务独占
pub struct FrameReceiver {
  topic: String,
  rx: Receiver<ImageMsg>,
}

impl FrameReceiver {
  pub fn topic(&self) -> &str {
    &self.topic
  }

  /// 阻塞取下一条图像消息，所有发送端退出后返回 None
  pub fn next_msg(&self) -> Option<ImageMsg> {
    self.rx.recv().ok()
  }
}

/// 建立一条有界帧频道
pub fn frame_channel(topic: &str, depth: usize) -> (FrameSender, FrameReceiver) {
  let (tx, rx) = sync_channel(depth);
  (
    FrameSender {
      topic: topic.to_string(),
      tx,
    },
    FrameReceiver {
      topic: topic.to_string(),
      rx,
    },
  )
}

/// 文本负载的发布口
///
/// 发布即忘：不阻塞流水线等待消费端确认。
pub trait TextSink {
  fn topic(&self) -> &str;
  fn emit(&self, payload: String);
}

/// 有界文本频道的发布端，溢出策略与帧频道一致（drop-newest）
pub struct TopicPublisher {
  topic: String,
  tx: SyncSender<String>,
}

impl TextSink for TopicPublisher {
  fn topic(&self) -> &str {
    &self.topic
  }

  fn emit(&self, payload: String) {
    match self.tx.try_send(payload) {
      Ok(()) => {}
      Err(TrySendError::Full(_)) => {
        warn!("频道 {} 输出缓冲已满，丢弃本帧负载", self.topic);
      }
      Err(TrySendError::Disconnected(_)) => {
        warn!("频道 {} 无消费端，丢弃负载", self.topic);
      }
    }
  }
}

/// 文本频道接收端
pub struct TextReceiver {
  topic: String,
  rx: Receiver<String>,
}

impl TextReceiver {
  pub fn topic(&self) -> &str {
    &self.topic
  }

  pub fn try_next(&self) -> Option<String> {
    self.rx.try_recv().ok()
  }
}

/// 建立一条有界文本频道
pub fn text_channel(topic: &str, depth: usize) -> (TopicPublisher, TextReceiver) {
  let (tx, rx) = sync_channel(depth);
  (
    TopicPublisher {
      topic: topic.to_string(),
      tx,
    },
    TextReceiver {
      topic: topic.to_string(),
      rx,
    },
  )
}
