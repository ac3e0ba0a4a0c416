use hexastore::Hexastore;

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

fn drain(mut cursor: hexastore::Cursor<'_>) -> Vec<(i64, i64, i64)> {
    let mut out = Vec::new();
    while let Some(row) = cursor.current() {
        out.push(row);
        if !cursor.advance() {
            break;
        }
    }
    out
}

#[test]
fn empty_store_round_trips() {
    common::init();
    let hx = Hexastore::new();
    let mut buf = Vec::new();
    hx.write(&mut buf).unwrap();
    let back = Hexastore::read(&mut &buf[..]).unwrap();
    assert_eq!(back.triples_count(), 0);
}

#[test]
fn populated_store_round_trips_with_same_triples_and_count() {
    common::init();
    let mut hx = Hexastore::new();
    for (s, p, o) in [(1, 2, 3), (1, 5, 3), (2, 2, 2), (1, 2, 5), (9, 9, 9)] {
        hx.add_triple(s, p, o);
    }

    let mut buf = Vec::new();
    hx.write(&mut buf).unwrap();
    let back = Hexastore::read(&mut &buf[..]).unwrap();

    assert_eq!(back.triples_count(), hx.triples_count());
    assert_eq!(
        drain(back.get_statements(0, 0, 0, 0)),
        drain(hx.get_statements(0, 0, 0, 0)),
    );
}

#[test]
fn truncated_stream_is_rejected_not_silently_accepted() {
    common::init();
    let mut hx = Hexastore::new();
    hx.add_triple(1, 2, 3);
    let mut buf = Vec::new();
    hx.write(&mut buf).unwrap();

    let truncated = &buf[..buf.len() - 1];
    assert!(Hexastore::read(&mut &truncated[..]).is_err());
}

#[test]
fn bad_magic_is_rejected() {
    common::init();
    let buf = [0u8; 16];
    let err = Hexastore::read(&mut &buf[..]).unwrap_err();
    assert!(matches!(err, hexastore::PersistError::BadMagic { .. }));
}
