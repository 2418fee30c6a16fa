// 该文件是 Yaowang （遥望） 项目的一部分。
// src/bin/label_manifest.rs - 离线标注格式转换
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

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

/// 把每图一份的归一化 YOLO 标注重写为绝对像素清单
///
/// 输入目录下每个 txt 含一条 `class cx cy w h` 记录（相对 320x160
/// 参考帧归一化），输出清单每图一行：
/// `path xmin,ymin,xmax,ymax,class_id`。
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 标注目录
  #[arg(long, value_name = "DIR")]
  pub dir: PathBuf,

  /// 输出清单文件
  #[arg(long, value_name = "FILE")]
  pub output: PathBuf,

  /// 参考帧宽度
  #[arg(long, default_value = "320", value_name = "PIXELS")]
  pub width: u32,

  /// 参考帧高度
  #[arg(long, default_value = "160", value_name = "PIXELS")]
  pub height: u32,

  /// 图像文件扩展名
  #[arg(long, default_value = "jpg", value_name = "EXT")]
  pub ext: String,
}

/// 归一化中心/宽高 → 绝对像素角点，固定比例缩放后截断取整
fn convert_record(record: &str, width: u32, height: u32) -> Result<(usize, [i32; 4])> {
  let fields: Vec<&str> = record.split_whitespace().collect();
  if fields.len() != 5 {
    bail!("记录应有 5 个字段，实际 {} 个: {record:?}", fields.len());
  }

  let class_id: usize = fields[0].parse().context("class 字段无效")?;
  let cx: f64 = fields[1].parse().context("cx 字段无效")?;
  let cy: f64 = fields[2].parse().context("cy 字段无效")?;
  let w: f64 = fields[3].parse().context("w 字段无效")?;
  let h: f64 = fields[4].parse().context("h 字段无效")?;

  let cx = cx * width as f64;
  let cy = cy * height as f64;
  let w = w * width as f64;
  let h = h * height as f64;

  let xmin = (cx - w / 2.0).trunc() as i32;
  let ymin = (cy - h / 2.0).trunc() as i32;
  let xmax = (cx + w / 2.0).trunc() as i32;
  let ymax = (cy + h / 2.0).trunc() as i32;

  Ok((class_id, [xmin, ymin, xmax, ymax]))
}

fn manifest_line(dir: &Path, stem: &str, ext: &str, class_id: usize, corners: [i32; 4]) -> String {
  format!(
    "{}/{}.{} {},{},{},{},{}",
    dir.display(),
    stem,
    ext,
    corners[0],
    corners[1],
    corners[2],
    corners[3],
    class_id
  )
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("标注目录: {}", args.dir.display());
  info!("参考帧: {}x{}", args.width, args.height);

  let mut entries: Vec<PathBuf> = std::fs::read_dir(&args.dir)
    .with_context(|| format!("无法读取目录 {}", args.dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
    .collect();
  entries.sort();

  let mut lines = Vec::with_capacity(entries.len());
  for path in &entries {
    let text =
      std::fs::read_to_string(path).with_context(|| format!("无法读取 {}", path.display()))?;
    let Some(record) = text.lines().next() else {
      warn!("{} 为空，跳过", path.display());
      continue;
    };

    let (class_id, corners) = convert_record(record, args.width, args.height)
      .with_context(|| format!("{} 解析失败", path.display()))?;

    let stem = path
      .file_stem()
      .and_then(|s| s.to_str())
      .context("文件名无效")?;
    lines.push(manifest_line(&args.dir, stem, &args.ext, class_id, corners));
  }

  std::fs::write(&args.output, lines.join("\n"))
    .with_context(|| format!("无法写出 {}", args.output.display()))?;
  info!("清单写出完成: {} ({} 行)", args.output.display(), lines.len());

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_converts_to_absolute_corners() {
    // 中心 (160, 80)，宽高 (40, 20) @ 320x160
    let (class_id, corners) = convert_record("0 0.5 0.5 0.125 0.125", 320, 160).unwrap();
    assert_eq!(class_id, 0);
    assert_eq!(corners, [140, 70, 180, 90]);
  }

  #[test]
  fn record_keeps_class_id() {
    let (class_id, _) = convert_record("3 0.5 0.5 0.1 0.1", 320, 160).unwrap();
    assert_eq!(class_id, 3);
  }

  #[test]
  fn malformed_records_are_rejected() {
    assert!(convert_record("0 0.5 0.5", 320, 160).is_err());
    assert!(convert_record("x 0.5 0.5 0.1 0.1", 320, 160).is_err());
    assert!(convert_record("0 0.5 0.5 0.1 0.1 0.9", 320, 160).is_err());
  }

  #[test]
  fn manifest_line_format() {
    let line = manifest_line(Path::new("./IMG"), "frame_000", "jpg", 0, [140, 70, 180, 90]);
    assert_eq!(line, "./IMG/frame_000.jpg 140,70,180,90,0");
  }
}
