use disk_dev::DeviceError;
use thiserror::Error;

/// 文件系统操作的统一错误
#[derive(Debug, Error)]
pub enum FsError {
    /// 位图已无空闲位，或写入超出文件的数据块上限
    #[error("no space left")]
    NoSpace,

    #[error(transparent)]
    Io(#[from] DeviceError),

    /// 磁盘记录编解码失败，通常意味着设备内容损坏
    #[error(transparent)]
    Codec(#[from] binrw::Error),

    #[error("not found")]
    NotFound,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("device too small: need {need} bytes, have {have}")]
    DeviceTooSmall { need: u64, have: u64 },
}
