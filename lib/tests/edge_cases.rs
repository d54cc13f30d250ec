use son::{Mode, Son, SonError, Value};
use std::io::Cursor;

type MemSon = Son<Cursor<Vec<u8>>>;

fn created(stack_size: usize) -> MemSon {
    let mut son = MemSon::new(stack_size);
    son.create(Cursor::new(Vec::new())).unwrap();
    son
}

#[test]
fn depth_never_exceeds_stack_size() {
    for limit in 1..6usize {
        let mut son = created(limit);
        son.open_obj("root").unwrap();
        for level in 1..limit {
            son.open_array(&format!("l{}", level), 0).unwrap();
            son.write("", level as u32).unwrap();
        }
        assert_eq!(son.depth(), limit);
        let err = son.open_obj("deep").unwrap_err();
        assert!(matches!(err, SonError::DepthExceeded { limit: l } if l == limit));
        assert_eq!(son.depth(), limit);
        // the current container still accepts values
        son.write("", 0).unwrap();
        let stream = son.close(true).unwrap();

        son.open(stream).unwrap();
        assert!(son.read("").unwrap().is_container());
    }
}

#[test]
fn mismatched_close_is_rejected() {
    let mut son = created(4);
    son.open_obj("root").unwrap();
    son.open_array("a", 0).unwrap();
    assert!(matches!(
        son.close_obj(),
        Err(SonError::StructureMismatch(_))
    ));
    assert!(matches!(
        son.close_data(),
        Err(SonError::StructureMismatch(_))
    ));
    assert_eq!(son.depth(), 2);
    son.close_array().unwrap();
    son.close_obj().unwrap();
    assert!(matches!(
        son.close_obj(),
        Err(SonError::StructureMismatch(_))
    ));
}

#[test]
fn close_all_closes_every_container() {
    let mut son = created(4);
    son.open_obj("root").unwrap();
    son.open_obj("a").unwrap();
    son.open_array("b", 0).unwrap();
    son.write("", 1).unwrap();
    son.open_data("c").unwrap();
    son.write_open_data(b"xyz").unwrap();
    let stream = son.close(true).unwrap();
    assert_eq!(son.mode(), Mode::Closed);

    son.open(stream).unwrap();
    assert_eq!(son.read_str("a.b[1]").unwrap(), "eHl6");
    assert_eq!(
        son.read("a.b").unwrap(),
        Value::Array {
            fixed_size: 0,
            count: 2
        }
    );
    let stream = son.close(false).unwrap();
    assert!(matches!(
        son.append(stream),
        Err(SonError::NotAppendable(_))
    ));
}

#[test]
fn open_data_is_closed_on_close() {
    let mut son = created(4);
    son.open_array("root", 0).unwrap();
    son.open_data("d").unwrap();
    son.write_open_data(&[9; 10]).unwrap();
    let stream = son.close(false).unwrap();

    // the data record was finalized, the root array left open-ended
    son.append(stream).unwrap();
    son.write("", 1).unwrap();
    let stream = son.close(true).unwrap();
    son.open(stream).unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(son.read_data("[0]", &mut buf).unwrap(), 10);
    assert_eq!(son.read_num("[1]").unwrap(), 1);
}

#[test]
fn operations_require_the_right_mode() {
    let mut son = MemSon::new(2);
    assert!(matches!(
        son.close(false),
        Err(SonError::StructureMismatch(_))
    ));
    assert!(matches!(
        son.open_obj("root"),
        Err(SonError::StructureMismatch(_))
    ));
    son.create(Cursor::new(Vec::new())).unwrap();
    assert!(matches!(
        son.create(Cursor::new(Vec::new())),
        Err(SonError::StructureMismatch(_))
    ));
    assert!(matches!(
        son.write_open_data(b"x"),
        Err(SonError::StructureMismatch(_))
    ));
    assert!(matches!(
        son.open_data("root"),
        Err(SonError::StructureMismatch(_))
    ));
}

#[test]
fn truncated_stream_is_corrupt() {
    let mut son = created(4);
    son.open_obj("root").unwrap();
    son.write("name", "Stratify").unwrap();
    son.write("value", 100u32).unwrap();
    son.close_obj().unwrap();
    let mut bytes = son.close(false).unwrap().into_inner();
    bytes.truncate(bytes.len() - 2);

    let err = son.open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, SonError::Corrupt(_)));
}

#[test]
fn release_abandons_a_half_written_document() {
    let mut son = created(4);
    son.open_obj("root").unwrap();
    son.write("x", 1).unwrap();
    let stream = son.release().unwrap();
    assert!(!son.is_open());
    assert_eq!(son.depth(), 0);

    // still readable as an open-ended document
    son.open(stream).unwrap();
    assert_eq!(son.read_num("x").unwrap(), 1);
}
