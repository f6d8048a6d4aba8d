use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::{FsError, FILE_BLOCKS, NAME_LEN};

/// 文件的类型标签，磁盘与内存共用
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little, repr = u32)]
#[repr(u32)]
pub enum FileKind {
    #[default]
    Regular = 0,
    Directory = 1,
    Symlink = 2,
}

impl FileKind {
    #[inline]
    pub fn is_dir(self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

/// 索引节点的磁盘形式。
///
/// 只存数据块号，不存任何内存指针；
/// `target` 仅符号链接使用，`dir_cnt` 仅目录使用。
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct InodeRecord {
    pub ino: u32,
    /// 内容的字节数
    pub size: u32,
    /// 符号链接的目标路径，NUL 填充
    pub target: [u8; NAME_LEN + 1],
    /// 目录的直接子项个数
    pub dir_cnt: u32,
    pub kind: FileKind,
    /// 数据块号数组，只有在用的前几个槽位有意义
    pub bno: [u32; FILE_BLOCKS],
}

impl InodeRecord {
    pub const SIZE: usize = 168;

    pub fn decode(bytes: &[u8]) -> Result<Self, FsError> {
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    pub fn encode(&self) -> Result<[u8; Self::SIZE], FsError> {
        let mut buf = [0u8; Self::SIZE];
        self.write(&mut Cursor::new(buf.as_mut_slice()))?;
        Ok(buf)
    }
}

/// 把名字装进 NUL 填充的定长缓冲；长度须已经校验过
pub(crate) fn pack_name(name: &str) -> [u8; NAME_LEN + 1] {
    debug_assert!(name.len() <= NAME_LEN);
    let mut buf = [0; NAME_LEN + 1];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

/// 取出 NUL 填充缓冲里的名字；非 UTF-8 的内容做有损转换
pub(crate) fn unpack_name(buf: &[u8]) -> String {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}
