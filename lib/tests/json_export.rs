use son::{Son, SonConfig};
use std::io::Cursor;

fn settings() -> Son<Cursor<Vec<u8>>> {
    let mut son = Son::new(4);
    son.create(Cursor::new(Vec::new())).unwrap();
    son.open_obj("root").unwrap();
    son.write("name", "Stratify").unwrap();
    son.write("date", "today").unwrap();
    son.write("value", 100u32).unwrap();
    son.open_obj("stuff").unwrap();
    son.write("hour", 12).unwrap();
    son.write("min", 0).unwrap();
    son.write("sec", 59).unwrap();
    son.close_obj().unwrap();
    son.close_obj().unwrap();
    let stream = son.close(false).unwrap();
    son.open(stream).unwrap();
    son
}

#[test]
fn numbers_are_exported_as_strings() {
    let mut son = settings();
    let expected = r#"{
    "name": "Stratify",
    "date": "today",
    "value": "100",
    "stuff": {
        "hour": "12",
        "min": "0",
        "sec": "59"
    }
}
"#;
    assert_eq!(son.to_json_string().unwrap(), expected);
}

#[test]
fn export_is_idempotent() {
    let mut son = settings();
    let first = son.to_json_string().unwrap();
    let second = son.to_json_string().unwrap();
    assert_eq!(first, second);
    // lookups in between do not disturb the export
    assert_eq!(son.read_num("stuff.sec").unwrap(), 59);
    assert_eq!(son.to_json_string().unwrap(), first);
}

#[test]
fn data_strings_and_escapes() {
    let config = SonConfig::builder().json_indent(0usize).build().unwrap();
    let mut son = Son::with_config(&config);
    son.create(Cursor::new(Vec::new())).unwrap();
    son.open_obj("root").unwrap();
    son.write_data("raw", &[0xde, 0xad, 0xbe, 0xef]).unwrap();
    son.write("quote", "say \"hi\"\n").unwrap();
    son.write("f", 0.5f32).unwrap();
    son.close_obj().unwrap();
    let stream = son.close(false).unwrap();
    son.open(stream).unwrap();

    let text = son.to_json_string().unwrap();
    assert_eq!(
        text,
        r#"{"raw":"3q2+7w==","quote":"say \"hi\"\n","f":"0.5"}"#
    );
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["quote"], "say \"hi\"\n");
}

#[test]
fn export_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("settings.json");
    let mut son = settings();
    son.to_json_file(&out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text, son.to_json_string().unwrap());
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(v["stuff"]["hour"], "12");
}
