mod block_file;
mod cli;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::sync::Arc;

use clap::Parser;
use disk_dev::DiskDevice;
use simple_fs::{FileKind, FsError, SimpleFileSystem};
use typed_bytesize::ByteSizeIec;

pub use self::{block_file::BlockFile, cli::Cli};

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&cli.device)?;
    // 新镜像按默认容量撑开；已有镜像保持原样以便重复挂载
    if fd.metadata()?.len() == 0 {
        fd.set_len(ByteSizeIec::mib(4).0)?;
    }

    let dev = Arc::new(BlockFile::new(fd)?);
    log::info!("device: {:?}, {}", cli.device, ByteSizeIec(dev.disk_size()));

    let mut fs = SimpleFileSystem::mount(dev).map_err(io::Error::other)?;

    if let Some(source) = &cli.source {
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                log::warn!("skipping a non-UTF-8 file name: {name:?}");
                continue;
            };

            let mut data = Vec::new();
            File::open(entry.path())?.read_to_end(&mut data)?;

            match pack(&mut fs, name, &data) {
                Ok(()) => {}
                Err(e @ FsError::AlreadyExists) => log::warn!("/{name}: {e}, skipping"),
                Err(e) => return Err(io::Error::other(e)),
            }
        }
    }

    fs.unmount().map_err(io::Error::other)?;
    Ok(())
}

/// 经由引擎的公开操作把一份内容挂到根目录下
fn pack(fs: &mut SimpleFileSystem, name: &str, data: &[u8]) -> Result<(), FsError> {
    let path = format!("/{name}");
    if fs.lookup(&path)?.found {
        return Err(FsError::AlreadyExists);
    }

    let dentry = fs.insert_child(fs.root(), name, FileKind::Regular)?;
    let ino = fs.allocate_inode_for(dentry)?;
    let written = fs.write_at(ino, 0, data)?;
    let stat = fs.stat(dentry)?;
    log::info!("packed {path}: {written} bytes in {} blocks", stat.blocks);
    Ok(())
}
