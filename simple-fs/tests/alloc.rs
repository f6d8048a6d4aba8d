use simple_fs::layout::Bitmap;

#[test]
fn first_fit_ascending() {
    let mut bitmap = Bitmap::new(16, 8);
    for expected in 0..16 {
        assert_eq!(Some(expected), bitmap.alloc());
    }
    assert_eq!(None, bitmap.alloc());
}

#[test]
fn indices_are_exclusive() {
    let mut bitmap = Bitmap::new(128, 16);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..128 {
        assert!(seen.insert(bitmap.alloc().unwrap()));
    }
    assert_eq!(None, bitmap.alloc());
}

#[test]
fn dealloc_reopens_the_lowest_hole() {
    let mut bitmap = Bitmap::new(16, 8);
    for _ in 0..4 {
        bitmap.alloc().unwrap();
    }
    bitmap.dealloc(1);
    assert!(!bitmap.is_set(1));
    assert_eq!(Some(1), bitmap.alloc());
    assert_eq!(Some(4), bitmap.alloc());
}

#[test]
fn capacity_caps_the_scan() {
    // 区段尾部多出的空闲位不算槽位
    let mut bitmap = Bitmap::new(4, 8);
    for _ in 0..4 {
        bitmap.alloc().unwrap();
    }
    assert_eq!(None, bitmap.alloc());
}

#[test]
#[should_panic]
fn dealloc_of_a_free_bit_panics() {
    let mut bitmap = Bitmap::new(16, 8);
    bitmap.dealloc(3);
}

#[test]
fn disk_mirror_round_trip() {
    let mut bitmap = Bitmap::new(16, 8);
    bitmap.alloc().unwrap();
    bitmap.alloc().unwrap();
    bitmap.dealloc(0);

    let bytes = bitmap.to_bytes(8);
    assert_eq!(8, bytes.len());
    assert_eq!(0b10, bytes[0]);

    let mut reloaded = Bitmap::new(16, 8);
    reloaded.load(&bytes);
    assert!(!reloaded.is_set(0));
    assert!(reloaded.is_set(1));
    assert_eq!(Some(0), reloaded.alloc());
}
