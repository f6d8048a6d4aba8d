//! # 会话层
//!
//! [`SimpleFileSystem`] 是一次挂载的全部状态：设备适配器、超级块、
//! 两张位图、dentry 竞技场和 inode 缓存都归它独占。
//! 挂载构造它，卸载消费它，没有任何全局可变状态。
//!
//! 挂载期间磁盘上的元数据可以落后于内存；
//! 持久化只发生在显式同步与卸载这两个时机。

use std::sync::Arc;

use disk_dev::DiskDevice;

use crate::disk::DiskAdapter;
use crate::layout::{
    pack_name, unpack_name, Bitmap, DentryRecord, FileKind, InodeRecord, SuperBlock, SuperRecord,
};
use crate::vfs::{validate_name, Dentry, DentryArena, DentryId, Inode, InodeCache, Stat};
use crate::{FsError, FILE_BLOCKS, MAGIC, NAME_LEN, ROOT_INO};

#[derive(Debug)]
pub struct SimpleFileSystem {
    disk: DiskAdapter,
    sb: SuperBlock,
    inode_bitmap: Bitmap,
    data_bitmap: Bitmap,
    pub(crate) arena: DentryArena,
    pub(crate) inodes: InodeCache,
}

impl SimpleFileSystem {
    /// 挂载设备。
    ///
    /// 读取超级块并核对魔数；对不上就按默认容量新建文件系统：
    /// 强制让根占用 0 号 inode，随即把根记录、超级块和两张位图
    /// 都写到盘上，挂载返回前新布局就已持久。
    pub fn mount(dev: Arc<dyn DiskDevice>) -> Result<Self, FsError> {
        let disk = DiskAdapter::new(dev);
        let block_size = disk.block_size();
        if block_size < InodeRecord::SIZE {
            return Err(FsError::InvalidArgument(
                "block size too small for inode records",
            ));
        }

        let rec = SuperRecord::decode(&disk.read(0, SuperRecord::SIZE)?)?;
        let (sb, fresh) = if rec.magic == MAGIC {
            (SuperBlock::from_record(&rec, block_size)?, false)
        } else {
            (SuperBlock::format(block_size), true)
        };

        if sb.end_offset() > disk.disk_size() {
            return Err(FsError::DeviceTooSmall {
                need: sb.end_offset(),
                have: disk.disk_size(),
            });
        }

        let mut inode_bitmap = Bitmap::new(sb.max_inodes as usize, sb.inode_bitmap_bytes());
        let mut data_bitmap = Bitmap::new(sb.max_blocks as usize, sb.data_bitmap_bytes());
        // 新建时两张位图从全空起步，不必从盘上读
        if !fresh {
            inode_bitmap.load(&disk.read(sb.inode_bitmap_offset as u64, sb.inode_bitmap_bytes())?);
            data_bitmap.load(&disk.read(sb.data_bitmap_offset as u64, sb.data_bitmap_bytes())?);
        }

        let mut fs = Self {
            disk,
            sb,
            inode_bitmap,
            data_bitmap,
            arena: DentryArena::new(),
            inodes: InodeCache::default(),
        };

        if fresh {
            let root = fs.arena.root();
            let ino = fs.allocate_inode_for(root)?;
            assert_eq!(ino, ROOT_INO);
            fs.sync_inode(ROOT_INO)?;
            fs.flush_super_and_bitmaps()?;
            log::info!("initialized a fresh filesystem");
        }

        fs.materialize(fs.arena.root())?;
        log::debug!(
            "mounted: block_size={block_size}, max_inodes={}, max_blocks={}",
            fs.sb.max_inodes,
            fs.sb.max_blocks
        );
        Ok(fs)
    }

    /// 卸载：从根向下刷写整棵内存树，再落盘超级块与两张位图。
    ///
    /// 会话被消费掉；即使中途出错，设备也随所有权一起释放。
    pub fn unmount(mut self) -> Result<(), FsError> {
        self.sync_inode(ROOT_INO)?;
        self.flush_super_and_bitmaps()?;
        log::debug!("unmounted");
        Ok(())
    }

    /// 物化 dentry 指向的 inode，缓存命中则直接返回。
    ///
    /// 目录顺带从数据块重建全部子 dentry 并按磁盘顺序挂进竞技场；
    /// 常规文件装载在用槽位的内容缓冲；符号链接只有记录本身。
    pub fn materialize(&mut self, id: DentryId) -> Result<(), FsError> {
        let Some(ino) = self.arena.get(id).ino else {
            return Err(FsError::InvalidArgument("dentry has no bound inode"));
        };
        if self.inodes.contains(ino) {
            return Ok(());
        }

        let rec =
            InodeRecord::decode(&self.disk.read(self.sb.inode_offset(ino), InodeRecord::SIZE)?)?;
        let block_size = self.sb.block_size;

        let mut inode = Inode::new(ino, rec.kind, id);
        inode.size = rec.size;
        inode.target = unpack_name(&rec.target);
        inode.bno = rec.bno;
        // 有损解码可能膨胀字节数，超限的目标路径视同损坏
        if inode.target.len() > NAME_LEN {
            return Err(FsError::InvalidArgument(
                "corrupt inode record: target too long",
            ));
        }

        match rec.kind {
            FileKind::Directory => {
                let per_block = DentryRecord::per_block(block_size);
                let dir_cnt = rec.dir_cnt as usize;
                if dir_cnt > per_block * FILE_BLOCKS {
                    return Err(FsError::InvalidArgument(
                        "corrupt directory record: too many entries",
                    ));
                }
                let blocks = dir_cnt.div_ceil(per_block);
                for &bno in &rec.bno[..blocks] {
                    if bno >= self.sb.max_blocks {
                        return Err(FsError::InvalidArgument(
                            "corrupt inode record: block number out of range",
                        ));
                    }
                }
                let mut records = Vec::with_capacity(dir_cnt);
                for i in 0..dir_cnt {
                    let offset = self.sb.data_block_offset(rec.bno[i / per_block])
                        + (i % per_block * DentryRecord::SIZE) as u64;
                    let bytes = self.disk.read(offset, DentryRecord::SIZE)?;
                    records.push(DentryRecord::decode(&bytes)?);
                }
                for record in &records {
                    if record.ino >= self.sb.max_inodes {
                        return Err(FsError::InvalidArgument(
                            "corrupt dentry record: inode number out of range",
                        ));
                    }
                    if record.name().len() > NAME_LEN {
                        return Err(FsError::InvalidArgument(
                            "corrupt dentry record: name too long",
                        ));
                    }
                }
                inode.blocks_in_use = blocks;
                for record in records {
                    let child = self.arena.insert(Dentry {
                        name: record.name(),
                        kind: record.kind,
                        parent: Some(id),
                        ino: Some(record.ino),
                    });
                    inode.children.push_back(child);
                }
            }
            FileKind::Regular => {
                let used = (rec.size as usize).div_ceil(block_size);
                if used > FILE_BLOCKS {
                    return Err(FsError::InvalidArgument(
                        "corrupt inode record: size too large",
                    ));
                }
                for &bno in &rec.bno[..used] {
                    if bno >= self.sb.max_blocks {
                        return Err(FsError::InvalidArgument(
                            "corrupt inode record: block number out of range",
                        ));
                    }
                }
                for slot in 0..used {
                    let offset = self.sb.data_block_offset(rec.bno[slot]);
                    inode.data[slot] = Some(self.disk.read(offset, block_size)?.into_boxed_slice());
                }
                inode.blocks_in_use = used;
            }
            FileKind::Symlink => {}
        }

        self.inodes.insert(inode);
        Ok(())
    }

    /// 在目录下新建一条具名的边；子项头插，新名字排最前。
    ///
    /// 只建边不分配 inode，同名冲突由调用方事先以查找排除。
    pub fn insert_child(
        &mut self,
        dir: DentryId,
        name: &str,
        kind: FileKind,
    ) -> Result<DentryId, FsError> {
        validate_name(name)?;
        self.materialize(dir)?;
        if !self.inode_of(dir).is_dir() {
            return Err(FsError::NotADirectory);
        }
        let child = self.arena.insert(Dentry {
            name: name.to_owned(),
            kind,
            parent: Some(dir),
            ino: None,
        });
        self.inode_of_mut(dir).prepend_child(child);
        Ok(child)
    }

    /// 把子项从目录的子项列表里摘下。
    ///
    /// dentry 本身留在竞技场中（下标保持稳定），它指向的 inode
    /// 也不动；删除路径随后应对该 inode 调用 [`Self::release_inode`]。
    pub fn remove_child(&mut self, dir: DentryId, child: DentryId) -> Result<(), FsError> {
        self.materialize(dir)?;
        let inode = self.inode_of_mut(dir);
        if !inode.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let Some(pos) = inode.children.iter().position(|&c| c == child) else {
            return Err(FsError::NotFound);
        };
        inode.children.remove(pos);
        Ok(())
    }

    /// 为 dentry 分配一个全新的 inode 并建立双向关联。
    ///
    /// 只改内存里的位图与缓存，持久性要等到下一次同步。
    pub fn allocate_inode_for(&mut self, id: DentryId) -> Result<u32, FsError> {
        let ino = self.inode_bitmap.alloc().ok_or(FsError::NoSpace)?;
        let kind = self.arena.get(id).kind;
        self.arena.get_mut(id).ino = Some(ino);
        self.inodes.insert(Inode::new(ino, kind, id));
        Ok(ino)
    }

    /// 给常规文件的第 `slot` 个块槽分配数据块，并挂上清零的缓冲。
    ///
    /// 槽位必须按序使用，跳号或重复分配都是错误；
    /// 超出块槽上限与位图耗尽同样报告 [`FsError::NoSpace`]。
    pub fn allocate_block_for(&mut self, ino: u32, slot: usize) -> Result<u32, FsError> {
        if slot >= FILE_BLOCKS {
            return Err(FsError::NoSpace);
        }
        let block_size = self.sb.block_size;
        {
            let Some(inode) = self.inodes.get(ino) else {
                return Err(FsError::InvalidArgument("inode not materialized"));
            };
            if inode.kind != FileKind::Regular {
                return Err(FsError::InvalidArgument(
                    "only regular files take explicit block allocation",
                ));
            }
            if slot != inode.blocks_in_use {
                return Err(FsError::InvalidArgument("block slots must be used in order"));
            }
        }
        let bno = self.ensure_block(ino, slot)?;
        let Some(inode) = self.inodes.get_mut(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        inode.data[slot] = Some(vec![0; block_size].into_boxed_slice());
        Ok(bno)
    }

    /// 把 inode 及其下方的内存结构刷回磁盘。
    ///
    /// 目录把子项记录按块打包写出（记录不跨块），写完子项记录
    /// 再递归进该子项；只递归缓存中已物化的子节点，
    /// 没装载过的子树被视为仍然持久；子项缩减后多出的
    /// 尾部块随即归还位图。常规文件先为覆盖
    /// `size` 的槽位补齐数据块，再写出各块缓冲。
    /// 最后写出（可能带着新块号的）inode 记录本身。
    /// 首个失败立即放弃整棵子树，已写出的部分不回滚。
    pub fn sync_inode(&mut self, ino: u32) -> Result<(), FsError> {
        let Some(inode) = self.inodes.get(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        log::trace!("sync ino={ino}");
        let kind = inode.kind;
        let size = inode.size;
        let children: Vec<DentryId> = inode.children().collect();

        match kind {
            FileKind::Directory => {
                let per_block = DentryRecord::per_block(self.sb.block_size);
                if children.len() > per_block * FILE_BLOCKS {
                    return Err(FsError::NoSpace);
                }
                let needed = children.len().div_ceil(per_block);
                for (i, child) in children.into_iter().enumerate() {
                    let bno = self.ensure_block(ino, i / per_block)?;
                    let entry = self.arena.get(child);
                    let Some(child_ino) = entry.ino else {
                        return Err(FsError::InvalidArgument("child dentry has no bound inode"));
                    };
                    let record = DentryRecord::new(&entry.name, entry.kind, child_ino);
                    let offset = self.sb.data_block_offset(bno)
                        + (i % per_block * DentryRecord::SIZE) as u64;
                    self.disk.write(offset, &record.encode()?)?;
                    if self.inodes.contains(child_ino) {
                        self.sync_inode(child_ino)?;
                    }
                }
                // 子项缩减后归还尾部多出的块
                let Some(inode) = self.inodes.get_mut(ino) else {
                    return Err(FsError::InvalidArgument("inode not materialized"));
                };
                while inode.blocks_in_use > needed {
                    inode.blocks_in_use -= 1;
                    self.data_bitmap.dealloc(inode.bno[inode.blocks_in_use]);
                    self.sb.used_bytes -= self.sb.block_size as u32;
                }
            }
            FileKind::Regular => {
                let used = (size as usize).div_ceil(self.sb.block_size);
                for slot in 0..used {
                    self.ensure_block(ino, slot)?;
                }
                let Some(inode) = self.inodes.get(ino) else {
                    return Err(FsError::InvalidArgument("inode not materialized"));
                };
                for slot in 0..used {
                    let Some(buf) = inode.data[slot].as_deref() else {
                        return Err(FsError::InvalidArgument("missing block buffer"));
                    };
                    self.disk.write(self.sb.data_block_offset(inode.bno[slot]), buf)?;
                }
            }
            FileKind::Symlink => {}
        }

        let Some(inode) = self.inodes.get(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        let record = InodeRecord {
            ino,
            size: inode.size,
            target: pack_name(inode.target()),
            dir_cnt: inode.child_count(),
            kind,
            bno: inode.bno,
        };
        self.disk.write(self.sb.inode_offset(ino), &record.encode()?)?;
        Ok(())
    }

    /// 从文件内容缓冲读出数据；越过文件末尾的部分截断
    pub fn read_at(&self, ino: u32, offset: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        let Some(inode) = self.inodes.get(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        match inode.kind {
            FileKind::Directory => return Err(FsError::IsADirectory),
            FileKind::Symlink => return Err(FsError::InvalidArgument("not a regular file")),
            FileKind::Regular => {}
        }

        let block_size = self.sb.block_size;
        let size = inode.size as usize;
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        let end = (offset + buf.len()).min(size);

        let mut start = offset;
        let mut read = 0;
        while start < end {
            let slot = start / block_size;
            let block_end = ((slot + 1) * block_size).min(end);
            let len = block_end - start;
            let Some(data) = inode.data[slot].as_deref() else {
                return Err(FsError::InvalidArgument("missing block buffer"));
            };
            let inblock = start % block_size;
            buf[read..read + len].copy_from_slice(&data[inblock..inblock + len]);
            read += len;
            start = block_end;
        }
        Ok(read)
    }

    /// 写入文件内容缓冲，新触及的槽位就地分配数据块并补上
    /// 清零缓冲；文件大小随写入增长。超出块上限的写入整体拒绝。
    pub fn write_at(&mut self, ino: u32, offset: usize, bytes: &[u8]) -> Result<usize, FsError> {
        {
            let Some(inode) = self.inodes.get(ino) else {
                return Err(FsError::InvalidArgument("inode not materialized"));
            };
            match inode.kind {
                FileKind::Directory => return Err(FsError::IsADirectory),
                FileKind::Symlink => return Err(FsError::InvalidArgument("not a regular file")),
                FileKind::Regular => {}
            }
        }
        if bytes.is_empty() {
            return Ok(0);
        }

        let block_size = self.sb.block_size;
        let end = offset + bytes.len();
        if end > FILE_BLOCKS * block_size {
            return Err(FsError::NoSpace);
        }

        let last = (end - 1) / block_size;
        for slot in 0..=last {
            self.ensure_block(ino, slot)?;
        }

        let Some(inode) = self.inodes.get_mut(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        for slot in 0..=last {
            if inode.data[slot].is_none() {
                inode.data[slot] = Some(vec![0; block_size].into_boxed_slice());
            }
        }

        let mut start = offset;
        let mut written = 0;
        while start < end {
            let slot = start / block_size;
            let block_end = ((slot + 1) * block_size).min(end);
            let len = block_end - start;
            let data = inode.data[slot].as_deref_mut().expect("slot buffer just ensured");
            let inblock = start % block_size;
            data[inblock..inblock + len].copy_from_slice(&bytes[written..written + len]);
            written += len;
            start = block_end;
        }
        inode.size = inode.size.max(end as u32);
        Ok(written)
    }

    /// 文件状态摘要；dentry 的 inode 必须已物化
    pub fn stat(&self, id: DentryId) -> Result<Stat, FsError> {
        let Some(ino) = self.arena.get(id).ino else {
            return Err(FsError::InvalidArgument("dentry has no bound inode"));
        };
        let Some(inode) = self.inodes.get(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        Ok(Stat {
            ino,
            kind: inode.kind.into(),
            size: inode.size,
            blocks: inode.blocks_in_use as u32,
            block_size: self.sb.block_size as u32,
        })
    }

    /// 释放 inode：归还它占有的全部数据块位与 inode 位，并逐出缓存。
    ///
    /// 供上层的删除、截断路径使用；根节点拒绝释放。
    /// dentry 仍留在竞技场里，把名字从父目录摘下是上层的职责，
    /// 目录也要由上层先行释放其子项。
    pub fn release_inode(&mut self, ino: u32) -> Result<(), FsError> {
        if ino == ROOT_INO {
            return Err(FsError::InvalidArgument("cannot release the root inode"));
        }
        let Some(inode) = self.inodes.remove(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        for slot in 0..inode.blocks_in_use {
            self.data_bitmap.dealloc(inode.bno[slot]);
            self.sb.used_bytes -= self.sb.block_size as u32;
        }
        self.inode_bitmap.dealloc(ino);
        log::debug!("released ino={ino}");
        Ok(())
    }

    /// 根目录的 dentry
    #[inline]
    pub fn root(&self) -> DentryId {
        self.arena.root()
    }

    /// 竞技场里的 dentry
    #[inline]
    pub fn dentry(&self, id: DentryId) -> &Dentry {
        self.arena.get(id)
    }

    /// 缓存中的 inode；尚未物化时为空
    #[inline]
    pub fn inode(&self, ino: u32) -> Option<&Inode> {
        self.inodes.get(ino)
    }

    #[inline]
    pub fn inode_mut(&mut self, ino: u32) -> Option<&mut Inode> {
        self.inodes.get_mut(ino)
    }

    /// 逻辑块大小
    #[inline]
    pub fn block_size(&self) -> usize {
        self.sb.block_size
    }

    /// 已分配数据块折合的字节数
    #[inline]
    pub fn used_bytes(&self) -> u32 {
        self.sb.used_bytes
    }

    /// 本次挂载生效的超级块
    #[inline]
    pub fn super_block(&self) -> &SuperBlock {
        &self.sb
    }

    /// 取 dentry 已物化的 inode；调用方必须先物化
    pub(crate) fn inode_of(&self, id: DentryId) -> &Inode {
        let ino = self.arena.get(id).ino.expect("dentry not bound to an inode");
        self.inodes.get(ino).expect("inode not materialized")
    }

    fn inode_of_mut(&mut self, id: DentryId) -> &mut Inode {
        let ino = self.arena.get(id).ino.expect("dentry not bound to an inode");
        self.inodes.get_mut(ino).expect("inode not materialized")
    }

    /// 槽位还没占有数据块时向位图要一个；返回槽位上的块号
    fn ensure_block(&mut self, ino: u32, slot: usize) -> Result<u32, FsError> {
        let Some(inode) = self.inodes.get_mut(ino) else {
            return Err(FsError::InvalidArgument("inode not materialized"));
        };
        if slot < inode.blocks_in_use {
            return Ok(inode.bno[slot]);
        }
        debug_assert_eq!(slot, inode.blocks_in_use);
        let bno = self.data_bitmap.alloc().ok_or(FsError::NoSpace)?;
        inode.bno[slot] = bno;
        inode.blocks_in_use += 1;
        self.sb.used_bytes += self.sb.block_size as u32;
        Ok(bno)
    }

    /// 超级块与两张位图各自写回保留区段
    fn flush_super_and_bitmaps(&self) -> Result<(), FsError> {
        self.disk.write(0, &self.sb.record().encode()?)?;
        self.disk.write(
            self.sb.inode_bitmap_offset as u64,
            &self.inode_bitmap.to_bytes(self.sb.inode_bitmap_bytes()),
        )?;
        self.disk.write(
            self.sb.data_bitmap_offset as u64,
            &self.data_bitmap.to_bytes(self.sb.data_bitmap_bytes()),
        )?;
        Ok(())
    }
}
