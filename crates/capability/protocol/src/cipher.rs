//! 设备报文流加密
//!
//! 自动密钥异或流：每条报文的密钥都从 [`INITIAL_KEY`] 开始，
//! 加密时密钥滚动为上一个密文字节，解密时同理。不跨报文保留状态。

/// 每条报文的初始密钥
pub const INITIAL_KEY: u8 = 171;

/// 加密任意字节序列，输出长度与输入相同
pub fn encrypt(plaintext: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    plaintext
        .iter()
        .map(|&byte| {
            key ^= byte;
            key
        })
        .collect()
}

/// 解密任意字节序列，`decrypt(&encrypt(x)) == x`
pub fn decrypt(ciphertext: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    ciphertext
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}
