//! # 路径解析层
//!
//! 从根出发逐段下降，沿途按需物化目录的 inode。
//! 命中与否通过 [`Lookup`] 报告；未命中时带回最深到达的 dentry，
//! 由调用方决定是否在那里补上缺失的一段。

use crate::vfs::DentryId;
use crate::{path, FsError, SimpleFileSystem};

/// 一次路径解析的结果
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    /// 命中的 dentry；未命中时是最深到达的目录，
    /// 或挡在中途的那个非目录
    pub dentry: DentryId,
    pub found: bool,
    /// 查询的就是根目录本身
    pub is_root: bool,
}

impl SimpleFileSystem {
    /// 解析一条绝对路径。
    ///
    /// 目录子项按完整文件名精确比较，前缀相同不算命中。
    /// 中途撞上常规文件属于结构性死路，与未命中同样报告
    /// `found = false`。返回时结果 dentry 的 inode 已物化，
    /// 除非它还没有绑定任何 inode。
    pub fn lookup(&mut self, path: &str) -> Result<Lookup, FsError> {
        if !path.starts_with('/') {
            return Err(FsError::InvalidArgument("path must be absolute"));
        }

        let total = path::level(path);
        let root = self.root();
        if total == 0 {
            return Ok(Lookup {
                dentry: root,
                found: true,
                is_root: true,
            });
        }

        let mut cursor = root;
        let mut found = false;

        for (depth, segment) in path::segments(path).enumerate() {
            // 尚未绑定 inode 的 dentry 挡路，视同未命中
            if self.arena.get(cursor).ino.is_none() {
                break;
            }
            self.materialize(cursor)?;
            let inode = self.inode_of(cursor);

            if !inode.is_dir() {
                log::debug!("lookup blocked by a non-directory: {}", self.arena.get(cursor).name);
                break;
            }

            let hit = inode
                .children()
                .find(|&child| self.arena.get(child).name == segment);

            match hit {
                None => {
                    log::debug!("lookup miss: {segment}");
                    break;
                }
                Some(child) if depth + 1 == total => {
                    cursor = child;
                    found = true;
                    break;
                }
                Some(child) => cursor = child,
            }
        }

        let bound = self.arena.get(cursor).ino.is_some();
        if bound {
            self.materialize(cursor)?;
        }
        Ok(Lookup {
            dentry: cursor,
            found: found && bound,
            is_root: false,
        })
    }
}
