use simple_fs::layout::{DentryRecord, FileKind, InodeRecord, SuperRecord};
use simple_fs::MAGIC;

#[test]
fn records() {
    assert_eq!(40, SuperRecord::SIZE);
    assert_eq!(168, InodeRecord::SIZE);
    assert_eq!(136, DentryRecord::SIZE);
}

#[test]
fn super_record_is_little_endian() {
    let rec = SuperRecord {
        magic: MAGIC,
        used_bytes: 0x0102_0304,
        max_inodes: 512,
        max_blocks: 2048,
        inode_bitmap_blocks: 1,
        inode_bitmap_offset: 1024,
        data_bitmap_blocks: 1,
        data_bitmap_offset: 2048,
        inode_table_offset: 3072,
        data_offset: 527360,
    };
    let bytes = rec.encode().unwrap();
    assert_eq!(MAGIC.to_le_bytes(), bytes[..4]);
    assert_eq!([0x04u8, 0x03, 0x02, 0x01], bytes[4..8]);
    assert_eq!(rec, SuperRecord::decode(&bytes).unwrap());
}

#[test]
fn inode_record_round_trip() {
    let mut target = [0u8; 128];
    target[..8].copy_from_slice(b"/usr/bin");
    let rec = InodeRecord {
        ino: 7,
        size: 4099,
        target,
        dir_cnt: 3,
        kind: FileKind::Symlink,
        bno: [11, 12, 13, 0, 0, 0],
    };
    let got = InodeRecord::decode(&rec.encode().unwrap()).unwrap();
    assert_eq!(rec, got);
}

#[test]
fn dentry_record_round_trip() {
    let rec = DentryRecord::new("hello", FileKind::Directory, 42);
    let got = DentryRecord::decode(&rec.encode().unwrap()).unwrap();
    assert_eq!(rec, got);
    assert_eq!("hello", got.name());
    assert_eq!(7, DentryRecord::per_block(1024));
}

#[test]
fn bad_kind_tag_fails_decoding() {
    let mut bytes = InodeRecord {
        ino: 0,
        size: 0,
        target: [0; 128],
        dir_cnt: 0,
        kind: FileKind::Regular,
        bno: [0; 6],
    }
    .encode()
    .unwrap();
    // kind 字段位于 ino、size、target、dir_cnt 之后
    bytes[140] = 0xff;
    assert!(InodeRecord::decode(&bytes).is_err());
}
