use crate::errors::error::AppError;
use bigdecimal::{BigDecimal, FromPrimitive};
use serde_json::Value;

/// 将 ether 浮点数转为 BigDecimal（NUMERIC 列）
pub fn native_unit_to_bigdecimal(value: f64) -> Result<BigDecimal, AppError> {
    BigDecimal::from_f64(value)
        .ok_or_else(|| AppError::Conversion(format!("数值 {} 转换为 BigDecimal 失败", value)))
}

/// 原始 JSON 截断到指定长度，用于日志输出
pub fn json_preview(value: &Value, max_len: usize) -> String {
    let text = value.to_string();
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}[...]", &text[..end])
}
