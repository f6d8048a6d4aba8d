//! # 磁盘数据结构层
//!
//! 设备上的五段布局，依次为：
//!
//! ```text
//! | 超级块 | 索引节点位图 | 数据块位图 | 索引节点表 | 数据块区域 |
//! ```
//!
//! 所有记录都是小端序的定长结构，且从不跨越逻辑块边界。

mod bitmap;
pub use bitmap::Bitmap;

mod super_block;
pub use super_block::{SuperBlock, SuperRecord};

mod inode;
pub(crate) use inode::{pack_name, unpack_name};
pub use inode::{FileKind, InodeRecord};

mod dir_entry;
pub use dir_entry::DentryRecord;
