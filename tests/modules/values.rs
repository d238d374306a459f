use bson_builder::{
    DateTime,
    Decimal128,
    RawBuilder,
    Timestamp,
    raw::RawBsonRef,
};
use pretty_assertions::assert_eq;

#[test]
fn datetime_rfc3339() {
    let dt = DateTime::parse_rfc3339_str("2020-06-09T10:58:07.095Z").unwrap();
    assert_eq!(dt.timestamp_millis(), 1_591_700_287_095);
    assert_eq!(dt.try_to_rfc3339_string().unwrap(), "2020-06-09T10:58:07.095Z");
    assert!(DateTime::parse_rfc3339_str("yesterday").is_err());
    assert!(DateTime::MAX.try_to_rfc3339_string().is_err());
}

#[test]
fn special_values_round_trip_through_builder() {
    let dec = Decimal128::from_bytes([7; 16]);
    let ts = Timestamp {
        time: 229_999_444,
        increment: 3,
    };
    let dt = DateTime::from_millis(-1);

    let mut builder = RawBuilder::new_array();
    builder.append(dec).unwrap();
    builder.append(ts).unwrap();
    builder.append(dt).unwrap();
    builder.append_min_key().unwrap();
    builder.append_max_key().unwrap();
    builder.append_undefined().unwrap();
    let arr = builder.extract_array().unwrap();

    let values: Vec<RawBsonRef<'_>> = arr.iter().map(|v| v.unwrap()).collect();
    assert_eq!(
        values,
        vec![
            RawBsonRef::Decimal128(dec),
            RawBsonRef::Timestamp(ts),
            RawBsonRef::DateTime(dt),
            RawBsonRef::MinKey,
            RawBsonRef::MaxKey,
            RawBsonRef::Undefined,
        ]
    );
}

#[test]
fn timestamp_increment_is_written_first() {
    let mut builder = RawBuilder::new_array();
    builder
        .append(Timestamp {
            time: 1,
            increment: 2,
        })
        .unwrap();
    let arr = builder.extract_array().unwrap();
    assert_eq!(&arr.as_bytes()[7..15], b"\x02\x00\x00\x00\x01\x00\x00\x00");
}
