use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use super::inode::{pack_name, unpack_name, FileKind};
use crate::{FsError, NAME_LEN};

/// 目录项的磁盘形式：名字、类型标签与指向的索引节点号。
///
/// 类型标签与目标节点一致，遍历目录时无需再读节点记录。
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DentryRecord {
    /// 最后一字节留给 NUL
    pub name: [u8; NAME_LEN + 1],
    pub kind: FileKind,
    pub ino: u32,
}

impl DentryRecord {
    pub const SIZE: usize = 136;

    pub fn new(name: &str, kind: FileKind, ino: u32) -> Self {
        Self {
            name: pack_name(name),
            kind,
            ino,
        }
    }

    pub fn name(&self) -> String {
        unpack_name(&self.name)
    }

    /// 一个逻辑块能容纳的目录项个数；目录项从不跨块
    #[inline]
    pub fn per_block(block_size: usize) -> usize {
        block_size / Self::SIZE
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FsError> {
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    pub fn encode(&self) -> Result<[u8; Self::SIZE], FsError> {
        let mut buf = [0u8; Self::SIZE];
        self.write(&mut Cursor::new(buf.as_mut_slice()))?;
        Ok(buf)
    }
}
