//! # 设备适配层
//!
//! 把任意字节区间的读写翻译成对齐的设备传输：
//! 区间先向外取整到逻辑块边界，再按设备的原生传输单元逐个搬运。
//! 非对齐写采用读出、拼接、写回的方式，不会波及区间外的字节。
//!
//! 逻辑块是文件系统的分配单位，固定为设备传输单元的两倍。

use std::sync::Arc;

use disk_dev::DiskDevice;

use crate::FsError;

#[derive(Debug)]
pub struct DiskAdapter {
    dev: Arc<dyn DiskDevice>,
    io_unit: usize,
    block_size: usize,
}

impl DiskAdapter {
    pub fn new(dev: Arc<dyn DiskDevice>) -> Self {
        let io_unit = dev.io_unit();
        Self {
            dev,
            io_unit,
            block_size: io_unit * 2,
        }
    }

    /// 逻辑块大小
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 设备总字节数
    #[inline]
    pub fn disk_size(&self) -> u64 {
        self.dev.disk_size()
    }

    /// 读出 `[offset, offset + len)` 的字节
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
        let (beg, bias, aligned) = self.align(offset, len);
        let mut buf = vec![0; aligned];
        let first_unit = (beg / self.io_unit as u64) as usize;
        for (i, chunk) in buf.chunks_mut(self.io_unit).enumerate() {
            self.dev.read_unit(first_unit + i, chunk)?;
        }
        buf.drain(..bias);
        buf.truncate(len);
        Ok(buf)
    }

    /// 把 `bytes` 写到 `offset` 处。
    ///
    /// 先整块读出落在区间上的内容，拼入新字节后整块写回，
    /// 块内区间外的旧字节原样保留。
    pub fn write(&self, offset: u64, bytes: &[u8]) -> Result<(), FsError> {
        let (beg, bias, aligned) = self.align(offset, bytes.len());
        let mut buf = self.read(beg, aligned)?;
        buf[bias..bias + bytes.len()].copy_from_slice(bytes);
        let first_unit = (beg / self.io_unit as u64) as usize;
        for (i, chunk) in buf.chunks(self.io_unit).enumerate() {
            self.dev.write_unit(first_unit + i, chunk)?;
        }
        Ok(())
    }

    /// 返回（对齐后的起点，区间在块内的偏移，对齐后的长度）
    fn align(&self, offset: u64, len: usize) -> (u64, usize, usize) {
        let bs = self.block_size as u64;
        let beg = offset / bs * bs;
        let bias = (offset - beg) as usize;
        let aligned = (bias + len).div_ceil(self.block_size) * self.block_size;
        (beg, bias, aligned)
    }
}
