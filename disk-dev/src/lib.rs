//! # 磁盘设备接口层
//!
//! 磁盘设备以固定大小的**传输单元**存取数据，并能报告自身容量与单元大小；
//! [`DiskDevice`] 就是对这类设备的抽象，实现了此特质的类型称为**设备驱动**。
//!
//! 文件系统的逻辑块大小在挂载时由传输单元大小推出，
//! 因此接口按单元编号寻址，块的换算由上层完成。

use std::fmt::Debug;
use std::sync::Mutex;

use thiserror::Error;

/// 磁盘设备驱动特质
pub trait DiskDevice: Send + Sync + Debug {
    /// 设备总容量，单位为字节
    fn disk_size(&self) -> u64;

    /// 设备的原生传输单元大小，单位为字节
    fn io_unit(&self) -> usize;

    /// 读取第 `unit_id` 个传输单元；`buf` 长度必须等于单元大小
    fn read_unit(&self, unit_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    /// 写入第 `unit_id` 个传输单元；`buf` 长度必须等于单元大小
    fn write_unit(&self, unit_id: usize, buf: &[u8]) -> Result<(), DeviceError>;
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("I/O failed at unit {unit}: {source}")]
    Io {
        unit: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("short transfer at unit {unit}: {got}/{want} bytes")]
    ShortTransfer { unit: usize, got: usize, want: usize },
}

/// 驻留内存的磁盘设备，容量固定，主要服务于测试
#[derive(Debug)]
pub struct MemDisk {
    io_unit: usize,
    data: Mutex<Vec<u8>>,
}

impl MemDisk {
    /// 模拟设备的默认传输单元大小
    pub const DEFAULT_IO_UNIT: usize = 512;

    #[inline]
    pub fn new(len: usize) -> Self {
        Self::with_io_unit(len, Self::DEFAULT_IO_UNIT)
    }

    pub fn with_io_unit(len: usize, io_unit: usize) -> Self {
        assert!(io_unit > 0 && len % io_unit == 0, "len must be unit aligned");
        Self {
            io_unit,
            data: Mutex::new(vec![0; len]),
        }
    }

    /// 当前盘上数据的快照
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl DiskDevice for MemDisk {
    #[inline]
    fn disk_size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    #[inline]
    fn io_unit(&self) -> usize {
        self.io_unit
    }

    fn read_unit(&self, unit_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let data = self.data.lock().unwrap();
        let beg = unit_id * self.io_unit;
        let end = beg + self.io_unit;
        if buf.len() != self.io_unit || end > data.len() {
            return Err(DeviceError::ShortTransfer {
                unit: unit_id,
                got: data.len().saturating_sub(beg).min(self.io_unit),
                want: self.io_unit,
            });
        }
        buf.copy_from_slice(&data[beg..end]);
        Ok(())
    }

    fn write_unit(&self, unit_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let mut data = self.data.lock().unwrap();
        let beg = unit_id * self.io_unit;
        let end = beg + self.io_unit;
        if buf.len() != self.io_unit || end > data.len() {
            return Err(DeviceError::ShortTransfer {
                unit: unit_id,
                got: data.len().saturating_sub(beg).min(self.io_unit),
                want: self.io_unit,
            });
        }
        data[beg..end].copy_from_slice(buf);
        Ok(())
    }
}
