//! 分页计算

use serde::Serialize;

use crate::error::{ApiError, Result};

/// 题库列表默认每页条数
pub const DEFAULT_SOAL_PER_PAGE: i64 = 1000;
/// 项目列表默认每页条数
pub const DEFAULT_PROGRAM_PAGE_SIZE: i64 = 10;

/// `ceil(total / size)`，size 非正时为 0
pub fn total_pages(total: i64, size: i64) -> i64 {
    if size > 0 {
        total / size + i64::from(total % size != 0)
    } else {
        0
    }
}

/// 偏移量溢出 i64 时返回 None
fn checked_offset(page: i64, size: i64) -> Option<i64> {
    (page - 1).checked_mul(size)
}

/// 题库列表分页信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total_rows: i64,
    pub total_perpage: i64,
    pub total_page: i64,
    pub current_page: i64,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
}

impl PageInfo {
    pub fn new(total_rows: i64, per_page: i64, page: i64) -> Self {
        let total_page = total_pages(total_rows, per_page);
        Self {
            total_rows,
            total_perpage: per_page,
            total_page,
            current_page: page,
            next_page: (page < total_page).then_some(page + 1),
            previous_page: (page > 1).then_some(page - 1),
        }
    }
}

/// 校验后的页码参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// 严格模式：缺省取默认值，显式传入的非正数返回 400
    pub fn strict(page: Option<i64>, size: Option<i64>, default_size: i64) -> Result<Self> {
        let page = page.unwrap_or(1);
        let size = size.unwrap_or(default_size);
        if page < 1 {
            return Err(ApiError::Validation("page harus lebih besar dari 0".into()));
        }
        if size < 1 {
            return Err(ApiError::Validation("perPage harus lebih besar dari 0".into()));
        }
        if checked_offset(page, size).is_none() {
            return Err(ApiError::Validation("page terlalu besar".into()));
        }
        Ok(Self { page, size })
    }

    /// 宽松模式：无法解析、非正数或偏移量溢出时回退到默认值
    pub fn lenient(page: Option<&str>, size: Option<&str>, default_size: i64) -> Self {
        fn parse(raw: Option<&str>) -> Option<i64> {
            raw.and_then(|v| v.trim().parse::<i64>().ok()).filter(|v| *v > 0)
        }

        let size = parse(size).unwrap_or(default_size);
        let page = parse(page)
            .filter(|p| checked_offset(*p, size).is_some())
            .unwrap_or(1);

        Self { page, size }
    }

    /// 构造时已校验不会溢出
    pub fn offset(&self) -> i64 {
        checked_offset(self.page, self.size).unwrap_or(0)
    }
}
