//! 位图：一位对应一个槽位（索引节点号或数据块号），置位即占用。
//!
//! 挂载期间常驻内存，只在挂载与卸载时同它的磁盘区段互相镜像。
//! 磁盘形式按小端序展开，第 `i` 字节的第 `j` 位对应槽位 `i * 8 + j`。

/// 常驻内存的分配位图
#[derive(Debug)]
pub struct Bitmap {
    /// 64 位一组的位存储
    groups: Vec<u64>,
    /// 可分配的槽位上限；区段尾部多出的位永不置位
    capacity: usize,
}

impl Bitmap {
    /// `extent_bytes` 为磁盘区段大小，须足以容纳 `capacity` 个位
    pub fn new(capacity: usize, extent_bytes: usize) -> Self {
        debug_assert!(extent_bytes * 8 >= capacity);
        Self {
            groups: vec![0; extent_bytes.div_ceil(8)],
            capacity,
        }
    }

    /// 可分配的槽位总数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 首次适应分配：自低位向高位找第一个空闲位，置位后返回其下标。
    /// 已无空闲槽位时返回空。
    pub fn alloc(&mut self) -> Option<u32> {
        let (group_index, ingroup) = self.groups.iter().enumerate().find_map(|(i, &bits)| {
            (bits != u64::MAX).then_some((i, bits.trailing_ones() as usize))
        })?;
        let index = group_index * 64 + ingroup;
        (index < self.capacity).then(|| {
            self.groups[group_index] |= 1 << ingroup;
            index as u32
        })
    }

    /// 释放下标处的槽位；下标必须在容量内且处于占用状态
    pub fn dealloc(&mut self, index: u32) {
        assert!((index as usize) < self.capacity, "index beyond bitmap capacity");
        let (group_index, ingroup) = (index as usize / 64, index as usize % 64);
        assert_ne!(self.groups[group_index] & (1 << ingroup), 0);
        self.groups[group_index] &= !(1 << ingroup);
    }

    /// 下标处是否已占用
    #[inline]
    pub fn is_set(&self, index: u32) -> bool {
        let (group_index, ingroup) = (index as usize / 64, index as usize % 64);
        self.groups[group_index] & (1 << ingroup) != 0
    }

    /// 从磁盘区段内容恢复位图
    pub fn load(&mut self, bytes: &[u8]) {
        debug_assert_eq!(bytes.len().div_ceil(8), self.groups.len());
        for (group, chunk) in self.groups.iter_mut().zip(bytes.chunks(8)) {
            let mut le = [0u8; 8];
            le[..chunk.len()].copy_from_slice(chunk);
            *group = u64::from_le_bytes(le);
        }
    }

    /// 位图的磁盘镜像，截到区段大小
    pub fn to_bytes(&self, extent_bytes: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = self.groups.iter().flat_map(|g| g.to_le_bytes()).collect();
        bytes.truncate(extent_bytes);
        bytes
    }
}
