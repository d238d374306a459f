use bson_builder::{error::ErrorKind, oid::ObjectId};

#[test]
fn timestamp_from_bytes() {
    let bytes: [u8; 12] = [
        0xDEu8, 0xADu8, 0xBEu8, 0xEFu8, // timestamp is 3735928559
        0xEFu8, 0xCDu8, 0xABu8, 0xFAu8, 0x29u8, 0x11u8, 0x22u8, 0x33u8,
    ];

    let oid = ObjectId::from_bytes(bytes);
    assert_eq!(3_735_928_559_u32, oid.timestamp());
}

#[test]
fn string_oid() {
    let s = "541b1a00e8a23afa832b218e";
    let oid = ObjectId::parse_str(s).unwrap();
    let bytes: [u8; 12] = [
        0x54u8, 0x1Bu8, 0x1Au8, 0x00u8, 0xE8u8, 0xA2u8, 0x3Au8, 0xFAu8, 0x83u8, 0x2Bu8, 0x21u8,
        0x8Eu8,
    ];

    assert_eq!(bytes, oid.bytes());
    assert_eq!(s, oid.to_string());
    assert_eq!(s, hex::encode(oid.bytes()));
}

#[test]
fn invalid_strings() {
    assert!(matches!(
        ObjectId::parse_str("541b1a00e8a23afa832b218").unwrap_err().kind,
        ErrorKind::ObjectId { .. }
    ));
    assert!(matches!(
        "not an object id".parse::<ObjectId>().unwrap_err().kind,
        ErrorKind::ObjectId { .. }
    ));
}

#[test]
fn oid_not_equals() {
    assert!(ObjectId::new() != ObjectId::new());
}

// the process-unique middle bytes are shared, the counter is not
#[test]
fn counter_changes() {
    let oid1_bytes = ObjectId::new().bytes();
    let oid2_bytes = ObjectId::new().bytes();
    assert_eq!(oid1_bytes[4..9], oid2_bytes[4..9]);
    assert_ne!(oid1_bytes[9..], oid2_bytes[9..]);
}
