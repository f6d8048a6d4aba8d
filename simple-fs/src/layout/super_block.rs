use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use crate::{
    FsError, DEFAULT_MAX_BLOCKS, DEFAULT_MAX_INODES, MAGIC, SUPER_BLOCKS,
};

/// 超级块的磁盘形式，固定位于设备起始处。
///
/// 除魔数与用量计数外全是布局几何；
/// 字段全部按字节数表达，与逻辑块大小解耦。
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct SuperRecord {
    pub magic: u32,
    /// 已分配数据块折合的字节数
    pub used_bytes: u32,
    pub max_inodes: u32,
    pub max_blocks: u32,
    pub inode_bitmap_blocks: u32,
    pub inode_bitmap_offset: u32,
    pub data_bitmap_blocks: u32,
    pub data_bitmap_offset: u32,
    pub inode_table_offset: u32,
    pub data_offset: u32,
}

impl SuperRecord {
    pub const SIZE: usize = 40;

    pub fn decode(bytes: &[u8]) -> Result<Self, FsError> {
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    pub fn encode(&self) -> Result<[u8; Self::SIZE], FsError> {
        let mut buf = [0u8; Self::SIZE];
        self.write(&mut Cursor::new(buf.as_mut_slice()))?;
        Ok(buf)
    }
}

/// 超级块的内存形式。
///
/// 只承载几何与用量；设备、位图、命名空间树等运行期状态
/// 都归会话对象所有。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub used_bytes: u32,
    pub max_inodes: u32,
    pub max_blocks: u32,
    pub inode_bitmap_blocks: u32,
    pub inode_bitmap_offset: u32,
    pub data_bitmap_blocks: u32,
    pub data_bitmap_offset: u32,
    pub inode_table_offset: u32,
    pub data_offset: u32,
    /// 逻辑块大小，挂载时由设备传输单元推出，不落盘
    pub block_size: usize,
}

impl SuperBlock {
    /// 按默认容量由逻辑块大小算出一套全新布局。
    ///
    /// 位图块数向上取整，五个区段首尾相接。
    pub fn format(block_size: usize) -> Self {
        let bs = block_size as u32;
        let bits_per_block = bs * 8;
        let inode_bitmap_blocks = DEFAULT_MAX_INODES.div_ceil(bits_per_block);
        let data_bitmap_blocks = DEFAULT_MAX_BLOCKS.div_ceil(bits_per_block);

        let inode_bitmap_offset = SUPER_BLOCKS as u32 * bs;
        let data_bitmap_offset = inode_bitmap_offset + inode_bitmap_blocks * bs;
        let inode_table_offset = data_bitmap_offset + data_bitmap_blocks * bs;
        let data_offset = inode_table_offset + DEFAULT_MAX_INODES * bs;

        Self {
            used_bytes: 0,
            max_inodes: DEFAULT_MAX_INODES,
            max_blocks: DEFAULT_MAX_BLOCKS,
            inode_bitmap_blocks,
            inode_bitmap_offset,
            data_bitmap_blocks,
            data_bitmap_offset,
            inode_table_offset,
            data_offset,
            block_size,
        }
    }

    /// 从磁盘记录恢复，并校验布局与当前设备几何自洽
    pub fn from_record(rec: &SuperRecord, block_size: usize) -> Result<Self, FsError> {
        let sb = Self {
            used_bytes: rec.used_bytes,
            max_inodes: rec.max_inodes,
            max_blocks: rec.max_blocks,
            inode_bitmap_blocks: rec.inode_bitmap_blocks,
            inode_bitmap_offset: rec.inode_bitmap_offset,
            data_bitmap_blocks: rec.data_bitmap_blocks,
            data_bitmap_offset: rec.data_bitmap_offset,
            inode_table_offset: rec.inode_table_offset,
            data_offset: rec.data_offset,
            block_size,
        };
        if !sb.layout_is_consistent() {
            return Err(FsError::InvalidArgument(
                "on-disk layout does not match device geometry",
            ));
        }
        Ok(sb)
    }

    pub fn record(&self) -> SuperRecord {
        SuperRecord {
            magic: MAGIC,
            used_bytes: self.used_bytes,
            max_inodes: self.max_inodes,
            max_blocks: self.max_blocks,
            inode_bitmap_blocks: self.inode_bitmap_blocks,
            inode_bitmap_offset: self.inode_bitmap_offset,
            data_bitmap_blocks: self.data_bitmap_blocks,
            data_bitmap_offset: self.data_bitmap_offset,
            inode_table_offset: self.inode_table_offset,
            data_offset: self.data_offset,
        }
    }

    /// 五段布局的自洽性：每段恰好紧跟前一段
    pub fn layout_is_consistent(&self) -> bool {
        let bs = self.block_size as u32;
        self.inode_bitmap_offset == SUPER_BLOCKS as u32 * bs
            && self.data_bitmap_offset == self.inode_bitmap_offset + self.inode_bitmap_blocks * bs
            && self.inode_table_offset == self.data_bitmap_offset + self.data_bitmap_blocks * bs
            && self.data_offset == self.inode_table_offset + self.max_inodes * bs
    }

    /// 布局末端的字节偏移，用于容量检查
    pub fn end_offset(&self) -> u64 {
        self.data_offset as u64 + self.max_blocks as u64 * self.block_size as u64
    }

    /// 第 `ino` 个索引节点记录的字节偏移；每个节点独占一个逻辑块
    #[inline]
    pub fn inode_offset(&self, ino: u32) -> u64 {
        self.inode_table_offset as u64 + ino as u64 * self.block_size as u64
    }

    /// 第 `bno` 个数据块的字节偏移
    #[inline]
    pub fn data_block_offset(&self, bno: u32) -> u64 {
        self.data_offset as u64 + bno as u64 * self.block_size as u64
    }

    /// 索引节点位图区段的字节数
    #[inline]
    pub fn inode_bitmap_bytes(&self) -> usize {
        self.inode_bitmap_blocks as usize * self.block_size
    }

    /// 数据块位图区段的字节数
    #[inline]
    pub fn data_bitmap_bytes(&self) -> usize {
        self.data_bitmap_blocks as usize * self.block_size
    }
}
