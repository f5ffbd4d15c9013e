use crate::errors::error::AppError;
use ethers_core::types::U256;

const HEX_BLOCK_SIZE: usize = 4;
const HEX_BLOCK_MULTIPLIER: f64 = 65536.0;
/// 1 ether = 10^18 wei
const NATIVE_UNIT_SCALE: f64 = 1e-18;

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// "0x1b4" → 436，超出 i64 范围时报错
pub fn hex_to_i64(value: &str) -> Result<i64, AppError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(AppError::Conversion(format!("空的十六进制数值: {:?}", value)));
    }
    let parsed = U256::from_str_radix(digits, 16)
        .map_err(|e| AppError::Conversion(format!("无效的十六进制数值 {:?}: {}", value, e)))?;
    u256_to_i64(parsed)
}

pub fn u256_to_i64(u256_val: U256) -> Result<i64, AppError> {
    // 1. 检查 U256 是否超出 U128 范围（即高 128 位是否为 0）
    let u128_val: u128 = u256_val.try_into().map_err(|e| {
        AppError::Conversion(format!("U256({}) 超出u128范围: {}", u256_val, e))
    })?;

    // 2. 检查 u128 是否超出 i64 范围
    i64::try_from(u128_val).map_err(|_| {
        AppError::Conversion(format!(
            "U256({}) 超出i64范围（最大值: {}）",
            u256_val,
            i64::MAX
        ))
    })
}

/// 将 256 位十六进制 wei 数值转为以 ether 为单位的浮点数。
///
/// 按 4 位十六进制分块（base 65536）从左到右累加，首块长度为 `len % 4`，
/// 避免一次性把超大整数塞进 f64。
pub fn hex_to_native_unit(value: &str) -> Result<f64, AppError> {
    let digits = strip_hex_prefix(value);
    // from_str_radix 接受前导 '+'，这里逐字符校验
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AppError::Conversion(format!("无效的十六进制数值: {:?}", value)));
    }

    let parse_chunk = |chunk: &str| {
        u32::from_str_radix(chunk, 16)
            .map(f64::from)
            .map_err(|e| AppError::Conversion(format!("无效的十六进制数值 {:?}: {}", value, e)))
    };

    let mut ret = 0.0;
    let first_partial_size = digits.len() % HEX_BLOCK_SIZE;
    if first_partial_size > 0 {
        ret += parse_chunk(&digits[..first_partial_size])?;
    }
    for pos in (first_partial_size..digits.len()).step_by(HEX_BLOCK_SIZE) {
        ret = ret * HEX_BLOCK_MULTIPLIER + parse_chunk(&digits[pos..pos + HEX_BLOCK_SIZE])?;
    }

    Ok(ret * NATIVE_UNIT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_unit_of_zero() {
        assert_eq!(hex_to_native_unit("0x0").unwrap(), 0.0);
    }

    #[test]
    fn one_ether_in_wei_is_one_native_unit() {
        assert_eq!(hex_to_native_unit("0xDE0B6B3A7640000").unwrap(), 1.0);
        assert_eq!(hex_to_native_unit("0xde0b6b3a7640000").unwrap(), 1.0);
        assert_eq!(hex_to_native_unit("0x1bc16d674ec80000").unwrap(), 2.0);
    }

    #[test]
    fn gas_price_in_native_units() {
        // 20 gwei
        let price = hex_to_native_unit("0x4a817c800").unwrap();
        assert!((price - 2e-8).abs() < 1e-20);
    }

    #[test]
    fn full_width_value_does_not_overflow() {
        let max = format!("0x{}", "f".repeat(64));
        let value = hex_to_native_unit(&max).unwrap();
        assert!(value.is_finite());
        assert!(value > 1e59);
    }

    #[test]
    fn native_unit_rejects_garbage() {
        assert!(hex_to_native_unit("0xzz").is_err());
    }

    #[test]
    fn native_unit_rejects_signs_and_empty_digits() {
        assert!(hex_to_native_unit("0x+1").is_err());
        assert!(hex_to_native_unit("0x-1").is_err());
        assert!(hex_to_native_unit("0x12 4").is_err());
        assert!(hex_to_native_unit("0x").is_err());
    }

    #[test]
    fn hex_integers_decode() {
        assert_eq!(hex_to_i64("0x0").unwrap(), 0);
        assert_eq!(hex_to_i64("0x1b4").unwrap(), 436);
        assert_eq!(hex_to_i64("0x5f5e100").unwrap(), 100_000_000);
    }

    #[test]
    fn hex_integers_reject_empty_and_overflow() {
        assert!(hex_to_i64("0x").is_err());
        assert!(hex_to_i64("0xffffffffffffffffff").is_err());
    }
}
