/* simple-fs 的整体架构，自上而下 */

// 路径解析层：从路径字符串走到 dentry
mod resolve;
pub use resolve::Lookup;

// 会话层：一次挂载的全部状态，以及挂载、同步、卸载协议
mod sfs;
pub use sfs::SimpleFileSystem;

// 索引节点层：内存中的命名空间树
mod vfs;
pub use vfs::{Dentry, DentryId, Inode, Stat, StatKind};

// 磁盘数据结构层：定长记录与位图
pub mod layout;
pub use layout::FileKind;

// 设备适配层：字节区间读写到设备传输的翻译
mod disk;

// 绝对路径工具
pub mod path;

mod error;
pub use error::FsError;

/// 超级块里的魔数，用于识别已初始化的设备
pub const MAGIC: u32 = 0x5346_5321;

/// 根目录固定占用的 inode 号
pub const ROOT_INO: u32 = 0;

/// 文件名与符号链接目标的最大字节长度，
/// 定长缓冲的最后一字节留给 NUL
pub const NAME_LEN: usize = 127;

/// 每个文件直接数据块指针的固定个数
pub const FILE_BLOCKS: usize = 6;

/// 新建文件系统的固定容量：索引节点个数
pub const DEFAULT_MAX_INODES: u32 = 512;

/// 新建文件系统的固定容量：数据块个数
pub const DEFAULT_MAX_BLOCKS: u32 = 2048;

/// 超级块占用的逻辑块数
pub const SUPER_BLOCKS: usize = 1;
