//! 长度前缀帧
//!
//! 请求与响应格式相同：`[4 字节大端长度][加密后的报文]`。

use crate::cipher::encrypt;

/// 长度前缀字节数
pub const LENGTH_PREFIX_LEN: usize = 4;

/// 加密报文并加上长度前缀
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let encrypted = encrypt(payload);
    let mut framed = Vec::with_capacity(LENGTH_PREFIX_LEN + encrypted.len());
    framed.extend_from_slice(&(encrypted.len() as u32).to_be_bytes());
    framed.extend_from_slice(&encrypted);
    framed
}

/// 读取长度前缀声明的报文长度（调用方保证至少 4 字节）
pub(crate) fn declared_length(prefix: &[u8]) -> usize {
    u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_has_length_header() {
        let framed = frame(b"test");
        assert_eq!(declared_length(&framed), encrypt(b"test").len());
        assert_eq!(&framed[LENGTH_PREFIX_LEN..], encrypt(b"test").as_slice());
    }

    #[test]
    fn test_frame_empty_payload() {
        assert_eq!(frame(b""), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_declared_length_is_big_endian() {
        assert_eq!(declared_length(&[0x00, 0x00, 0x01, 0x02]), 258);
    }
}
