use std::sync::Arc;

use disk_dev::MemDisk;
use simple_fs::{path, FileKind, FsError, SimpleFileSystem};

const DISK_SIZE: usize = 4 * 1024 * 1024;

fn fresh() -> SimpleFileSystem {
    SimpleFileSystem::mount(Arc::new(MemDisk::new(DISK_SIZE))).unwrap()
}

/// 建边并随即分配 inode，等价于前端的创建动作
fn create(fs: &mut SimpleFileSystem, dir: simple_fs::DentryId, name: &str, kind: FileKind) -> u32 {
    let dentry = fs.insert_child(dir, name, kind).unwrap();
    fs.allocate_inode_for(dentry).unwrap()
}

#[test]
fn root_resolves_to_itself() {
    let mut fs = fresh();
    let hit = fs.lookup("/").unwrap();
    assert!(hit.found);
    assert!(hit.is_root);
    assert_eq!("/", fs.dentry(hit.dentry).name);
}

#[test]
fn whole_name_must_match() {
    let mut fs = fresh();
    let root = fs.root();
    create(&mut fs, root, "abc", FileKind::Regular);

    assert!(fs.lookup("/abc").unwrap().found);

    // 存在的名字是查询串的前缀
    let miss = fs.lookup("/abcd").unwrap();
    assert!(!miss.found);
    assert_eq!(root, miss.dentry);

    // 查询串是存在名字的前缀
    create(&mut fs, root, "xyzw", FileKind::Regular);
    assert!(!fs.lookup("/xyz").unwrap().found);
}

#[test]
fn walks_nested_directories() {
    let mut fs = fresh();
    let root = fs.root();
    create(&mut fs, root, "a", FileKind::Directory);
    let a = fs.lookup("/a").unwrap().dentry;
    create(&mut fs, a, "b", FileKind::Directory);
    let b = fs.lookup("/a/b").unwrap().dentry;
    create(&mut fs, b, "c", FileKind::Regular);

    let hit = fs.lookup("/a/b/c").unwrap();
    assert!(hit.found);
    assert_eq!("c", fs.dentry(hit.dentry).name);
    assert_eq!(Some(b), fs.dentry(hit.dentry).parent);

    // 未命中带回最深到达的目录
    let miss = fs.lookup("/a/b/nope").unwrap();
    assert!(!miss.found);
    assert_eq!(b, miss.dentry);
    let miss = fs.lookup("/a/nope/c").unwrap();
    assert!(!miss.found);
    assert_eq!(a, miss.dentry);
}

#[test]
fn regular_file_is_a_dead_end() {
    let mut fs = fresh();
    let root = fs.root();
    create(&mut fs, root, "f", FileKind::Regular);
    let f = fs.lookup("/f").unwrap().dentry;

    let blocked = fs.lookup("/f/deeper").unwrap();
    assert!(!blocked.found);
    assert_eq!(f, blocked.dentry);
}

#[test]
fn relative_paths_are_rejected() {
    let mut fs = fresh();
    assert!(matches!(
        fs.lookup("a/b"),
        Err(FsError::InvalidArgument(_))
    ));
}

#[test]
fn name_rules() {
    let mut fs = fresh();
    let root = fs.root();
    assert!(matches!(
        fs.insert_child(root, "", FileKind::Regular),
        Err(FsError::InvalidArgument(_))
    ));
    assert!(matches!(
        fs.insert_child(root, "a/b", FileKind::Regular),
        Err(FsError::InvalidArgument(_))
    ));
    assert!(matches!(
        fs.insert_child(root, &"x".repeat(128), FileKind::Regular),
        Err(FsError::InvalidArgument(_))
    ));
    // 127 字节正好顶满名字缓冲
    assert!(fs.insert_child(root, &"x".repeat(127), FileKind::Regular).is_ok());
}

#[test]
fn children_under_a_file_are_refused() {
    let mut fs = fresh();
    let root = fs.root();
    create(&mut fs, root, "f", FileKind::Regular);
    let f = fs.lookup("/f").unwrap().dentry;
    assert!(matches!(
        fs.insert_child(f, "x", FileKind::Regular),
        Err(FsError::NotADirectory)
    ));
}

#[test]
fn path_helpers() {
    assert_eq!(0, path::level("/"));
    assert_eq!(3, path::level("/a/b/c"));
    assert_eq!(2, path::level("//a//b/"));
    assert_eq!(Some("b"), path::file_name("/a/b"));
    assert_eq!(None, path::file_name("/"));
    assert_eq!(vec!["a", "b"], path::segments("/a//b/").collect::<Vec<_>>());
}
