use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use disk_dev::{DeviceError, DiskDevice};

/// The standard sector size of a block device. Data is transferred in multiples of this size.
const SECTOR_SIZE: usize = 512;

/// 宿主文件充当的磁盘设备
#[derive(Debug)]
pub struct BlockFile {
    len: u64,
    file: Mutex<File>,
}

impl BlockFile {
    pub fn new(fd: File) -> io::Result<Self> {
        let len = fd.metadata()?.len();
        Ok(Self {
            len,
            file: Mutex::new(fd),
        })
    }
}

impl DiskDevice for BlockFile {
    fn disk_size(&self) -> u64 {
        self.len
    }

    fn io_unit(&self) -> usize {
        SECTOR_SIZE
    }

    fn read_unit(&self, unit_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((unit_id * SECTOR_SIZE) as u64))
            .map_err(|source| DeviceError::Io { unit: unit_id, source })?;
        file.read_exact(buf)
            .map_err(|source| DeviceError::Io { unit: unit_id, source })
    }

    fn write_unit(&self, unit_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((unit_id * SECTOR_SIZE) as u64))
            .map_err(|source| DeviceError::Io { unit: unit_id, source })?;
        file.write_all(buf)
            .map_err(|source| DeviceError::Io { unit: unit_id, source })
    }
}
