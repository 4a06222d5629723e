//! 像素选择与像素对枚举

use crate::error::{CorrelationError, CorrelationResult};
use crate::tools::constants::sensor::GRID_PIXELS;
use serde::Serialize;
use std::fmt;

/// 像素编号（LinoSPAD2 共256个像素）
pub type PixelId = u16;

/// 一个无序像素对及其在网格中的位置
///
/// `row = q`，`col = w - 1`，对应 4×4 子图网格的上三角。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelPair {
    /// 在枚举顺序中的位置（0..10）
    pub index: usize,
    pub first: PixelId,
    pub second: PixelId,
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for PixelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// 一个网格的5个像素（有序、互不相同）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSelection {
    pixels: [PixelId; GRID_PIXELS],
}

impl PixelSelection {
    pub fn new(pixels: &[PixelId]) -> CorrelationResult<Self> {
        let pixels: [PixelId; GRID_PIXELS] = pixels.try_into().map_err(|_| {
            CorrelationError::InvalidInput(format!(
                "需要恰好 {GRID_PIXELS} 个像素，实际 {} 个",
                pixels.len()
            ))
        })?;

        for (i, pixel) in pixels.iter().enumerate() {
            if pixels[..i].contains(pixel) {
                return Err(CorrelationError::InvalidInput(format!(
                    "像素 {pixel} 重复出现，像素对要求两个不同像素"
                )));
            }
        }

        Ok(Self { pixels })
    }

    #[inline]
    pub fn pixels(&self) -> &[PixelId] {
        &self.pixels
    }

    /// 按 5×5 网格行优先顺序枚举上三角（跳过对角线），共10对
    pub fn pairs(&self) -> Vec<PixelPair> {
        (0..GRID_PIXELS)
            .flat_map(|q| (q + 1..GRID_PIXELS).map(move |w| (q, w)))
            .enumerate()
            .map(|(index, (q, w))| PixelPair {
                index,
                first: self.pixels[q],
                second: self.pixels[w],
                row: q,
                col: w - 1,
            })
            .collect()
    }
}
