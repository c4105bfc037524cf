use std::path::Path;

use anyhow::Result;

/// 从图片中提取的简单视觉特征
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// 色调，范围 0~360
    pub tone: f64,
    /// 亮度，范围 0~255
    pub brightness: f64,
}

/// 特征提取器
///
/// 调用方会在阻塞线程池中执行，实现可以是 CPU 密集型的
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Features>;
}

#[cfg(feature = "opencv")]
pub use self::hsv::HsvAnalyzer;

#[cfg(feature = "opencv")]
mod hsv {
    use std::path::Path;

    use anyhow::{Result, anyhow};
    use opencv::prelude::*;
    use opencv::{core, imgcodecs, imgproc};

    use super::{FeatureExtractor, Features};

    /// 基于 HSV 色彩空间均值的分析器
    #[derive(Debug, Default, Clone, Copy)]
    pub struct HsvAnalyzer;

    impl FeatureExtractor for HsvAnalyzer {
        fn extract(&self, path: &Path) -> Result<Features> {
            let filename = path.to_str().ok_or_else(|| anyhow!("无效的路径: {}", path.display()))?;
            let img = imgcodecs::imread(filename, imgcodecs::IMREAD_COLOR)?;
            if img.empty() {
                return Err(anyhow!("无法解码图片: {}", path.display()));
            }
            let mut hsv = Mat::default();
            imgproc::cvt_color_def(&img, &mut hsv, imgproc::COLOR_BGR2HSV)?;
            let mean = core::mean_def(&hsv)?;
            // OpenCV 中 8bit 图像的 H 范围是 0~180，乘 2 还原为角度
            Ok(Features { tone: mean[0] * 2.0, brightness: mean[2] })
        }
    }
}

/// 返回编译时启用的特征提取器
pub fn default_extractor() -> Result<std::sync::Arc<dyn FeatureExtractor>> {
    #[cfg(feature = "opencv")]
    {
        Ok(std::sync::Arc::new(HsvAnalyzer))
    }
    #[cfg(not(feature = "opencv"))]
    {
        Err(anyhow::anyhow!("未启用 opencv 特性，无法分析图片"))
    }
}
