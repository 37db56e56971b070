use verifycell::{Error, SpinLock, Verified, audit, payload_fields};

#[test]
fn test_construct_and_verify() {
    let v = Verified::new(100i32);
    assert!(v.verify());
    assert_ne!(v.checksum(), 0);
}

#[test]
fn test_modify_refreshes_checksum() {
    let v = Verified::new(100i32);
    let old = v.checksum();
    *v.modify() = 999;
    assert!(v.verify());
    assert_ne!(v.checksum(), old);
}

#[test]
fn test_string_append() {
    let s = Verified::new(String::from("hello"));
    s.modify().push_str(" world");
    assert_eq!(&*s.as_str(), "hello world");
    assert!(s.verify());
}

#[test]
fn test_raw_write_detected() {
    let v = Verified::new(100i32);
    unsafe { v.as_ptr().write(999) };
    assert!(!v.verify());
    assert!(matches!(v.check(), Err(Error::ChecksumMismatch { .. })));
}

#[test]
fn test_array_indexing() {
    let a = Verified::new([1, 2, 3, 4, 5]);
    assert_eq!(*a.at(4), 5);
    assert!(a.verify());
}

struct Player {
    health: i32,
    mana: i32,
    name: String,
}

payload_fields!(Player { health, mana, name });

#[test]
fn test_user_struct_round_trip() {
    let p = Verified::new(Player {
        health: 100,
        mana: 50,
        name: "ann".into(),
    });
    {
        let mut g = p.modify();
        g.health -= 30;
        g.name.push_str("ie");
    }
    assert!(p.verify());
    assert_eq!(p.get().health, 70);
    assert_eq!(p.get().mana, 50);
    assert_eq!(p.get().name, "annie");
}

#[test]
fn test_spin_lock_container() {
    let v: Verified<Vec<u32>, SpinLock> = Verified::with_lock(vec![1, 2, 3]);
    v.modify().push(4);
    assert_eq!(v.iter().sum::<u32>(), 10);
    assert!(v.verify());
}

#[test]
fn test_audit_sweep() {
    let cells: Vec<Verified<i32>> = (0..100).map(Verified::new).collect();
    unsafe { *cells[42].as_ptr() += 1 };
    let report = audit(&cells);
    assert_eq!(report.failures, vec![42]);
}
