// 该文件是 Yaowang （遥望） 项目的一部分。
// src/pipeline/latency.rs - 单帧耗时测量
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

use std::time::Instant;

/// 单帧耗时监视：入口计时，标注帧发布后读数
pub struct LatencyMonitor {
  start: Instant,
}

impl LatencyMonitor {
  pub fn start() -> Self {
    Self {
      start: Instant::now(),
    }
  }

  pub fn elapsed_ms(&self) -> u128 {
    self.start.elapsed().as_millis()
  }

  /// 本帧的近似吞吐
  pub fn fps(&self) -> Option<f32> {
    fps_from_ms(self.elapsed_ms())
  }
}

/// `fps = 1000 / 耗时毫秒`，耗时为零时无定义，返回 None 跳过上报
pub fn fps_from_ms(elapsed_ms: u128) -> Option<f32> {
  if elapsed_ms == 0 {
    None
  } else {
    Some(1000.0 / elapsed_ms as f32)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_elapsed_never_divides() {
    assert_eq!(fps_from_ms(0), None);
  }

  #[test]
  fn fps_is_inverse_of_elapsed() {
    assert_eq!(fps_from_ms(50), Some(20.0));
    assert_eq!(fps_from_ms(1000), Some(1.0));
  }

  #[test]
  fn monitor_measures_forward_time() {
    let monitor = LatencyMonitor::start();
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(monitor.elapsed_ms() >= 2);
  }
}
