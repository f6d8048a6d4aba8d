//! # 索引节点层
//!
//! 内存中的命名空间树。dentry 是树里一条具名的边，全部存放在
//! 以稳定下标为键的竞技场中，父子关系都用下标表达；
//! inode 承载对象的元数据与内容缓冲，集中在以 ino 为键的缓存里，
//! 每次挂载至多从磁盘装载一次。
//!
//! 两边通过 `Dentry::ino` 与 `Inode::dentry` 互相引用，
//! 任何一侧都不持有对方的所有权。

use std::collections::{HashMap, VecDeque};

use derive_more::{From, Into};
use enumflags2::bitflags;

use crate::layout::FileKind;
use crate::{FsError, FILE_BLOCKS, NAME_LEN, ROOT_INO};

/// dentry 在竞技场内的稳定下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, From, Into)]
pub struct DentryId(usize);

/// 命名空间树中一条具名的边
#[derive(Debug)]
pub struct Dentry {
    pub name: String,
    /// 与目标 inode 的类型一致，遍历时无需装载节点即可判断
    pub kind: FileKind,
    /// 父目录的 dentry；根没有
    pub parent: Option<DentryId>,
    /// 指向的索引节点号；新建且尚未分配节点时为空
    pub ino: Option<u32>,
}

/// 持有全部 dentry 的竞技场；0 号槽位恒为根。
///
/// dentry 只增不删，下标因此保持稳定，
/// 摘除名字表现为把它从父目录的子项列表中移走。
#[derive(Debug)]
pub struct DentryArena {
    slots: Vec<Dentry>,
}

impl DentryArena {
    /// 建立只含根 dentry 的竞技场
    pub fn new() -> Self {
        Self {
            slots: vec![Dentry {
                name: String::from("/"),
                kind: FileKind::Directory,
                parent: None,
                ino: Some(ROOT_INO),
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> DentryId {
        DentryId(0)
    }

    pub fn insert(&mut self, dentry: Dentry) -> DentryId {
        self.slots.push(dentry);
        DentryId::from(self.slots.len() - 1)
    }

    #[inline]
    pub fn get(&self, id: DentryId) -> &Dentry {
        &self.slots[usize::from(id)]
    }

    #[inline]
    pub fn get_mut(&mut self, id: DentryId) -> &mut Dentry {
        &mut self.slots[usize::from(id)]
    }
}

impl Default for DentryArena {
    fn default() -> Self {
        Self::new()
    }
}

/// 索引节点的内存形式
#[derive(Debug)]
pub struct Inode {
    pub ino: u32,
    /// 内容的字节数；目录不使用
    pub size: u32,
    pub kind: FileKind,
    /// 符号链接的目标路径
    pub(crate) target: String,
    /// 主名字，即指向本节点的 dentry
    pub dentry: DentryId,
    /// 子项列表，仅目录使用；新插入的子项排在最前
    pub(crate) children: VecDeque<DentryId>,
    /// 数据块号数组，只有前 `blocks_in_use` 个槽位有意义
    pub(crate) bno: [u32; FILE_BLOCKS],
    /// 已占有数据块的槽位个数
    pub(crate) blocks_in_use: usize,
    /// 常规文件的逐块内容缓冲
    pub(crate) data: [Option<Box<[u8]>>; FILE_BLOCKS],
}

impl Inode {
    pub(crate) fn new(ino: u32, kind: FileKind, dentry: DentryId) -> Self {
        Self {
            ino,
            size: 0,
            kind,
            target: String::new(),
            dentry,
            children: VecDeque::new(),
            bno: [0; FILE_BLOCKS],
            blocks_in_use: 0,
            data: std::array::from_fn(|_| None),
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// 直接子项的个数
    #[inline]
    pub fn child_count(&self) -> u32 {
        self.children.len() as u32
    }

    /// 依当前排列迭代子项
    pub fn children(&self) -> impl Iterator<Item = DentryId> + '_ {
        self.children.iter().copied()
    }

    /// 头插一个子项
    pub(crate) fn prepend_child(&mut self, child: DentryId) {
        self.children.push_front(child);
    }

    /// 符号链接的目标路径
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// 设置符号链接目标，长度与名字缓冲同限
    pub fn set_target(&mut self, target: &str) -> Result<(), FsError> {
        if self.kind != FileKind::Symlink {
            return Err(FsError::InvalidArgument("not a symlink"));
        }
        if target.len() > NAME_LEN {
            return Err(FsError::InvalidArgument("symlink target too long"));
        }
        self.target = target.to_owned();
        Ok(())
    }

    /// 在用的数据块号
    pub fn block_numbers(&self) -> &[u32] {
        &self.bno[..self.blocks_in_use]
    }
}

/// 以 ino 为键的索引节点缓存。
///
/// 对磁盘而言它是唯一入口：同一个 ino 在一次挂载内
/// 至多装载一次，之后的读写都走缓存里的这一份。
#[derive(Debug, Default)]
pub struct InodeCache {
    map: HashMap<u32, Inode>,
}

impl InodeCache {
    #[inline]
    pub fn contains(&self, ino: u32) -> bool {
        self.map.contains_key(&ino)
    }

    #[inline]
    pub fn get(&self, ino: u32) -> Option<&Inode> {
        self.map.get(&ino)
    }

    #[inline]
    pub fn get_mut(&mut self, ino: u32) -> Option<&mut Inode> {
        self.map.get_mut(&ino)
    }

    pub fn insert(&mut self, inode: Inode) {
        self.map.insert(inode.ino, inode);
    }

    pub fn remove(&mut self, ino: u32) -> Option<Inode> {
        self.map.remove(&ino)
    }
}

/// 文件状态摘要
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub ino: u32,
    pub kind: StatKind,
    /// 内容的字节数
    pub size: u32,
    /// 占有的数据块数
    pub blocks: u32,
    /// 逻辑块大小
    pub block_size: u32,
}

/// 状态摘要里的类型标志位
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatKind {
    DIR = 0o040000,
    #[default]
    FILE = 0o100000,
    LINK = 0o020000,
}

impl From<FileKind> for StatKind {
    #[inline]
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Directory => Self::DIR,
            FileKind::Regular => Self::FILE,
            FileKind::Symlink => Self::LINK,
        }
    }
}

/// 校验一段文件名：非空、不含 `/`、不超长
pub(crate) fn validate_name(name: &str) -> Result<(), FsError> {
    if name.is_empty() {
        return Err(FsError::InvalidArgument("empty file name"));
    }
    if name.contains('/') {
        return Err(FsError::InvalidArgument("file name contains '/'"));
    }
    if name.len() > NAME_LEN {
        return Err(FsError::InvalidArgument("file name too long"));
    }
    Ok(())
}
