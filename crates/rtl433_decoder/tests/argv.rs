use rtl433_decoder::{ArgValue, DecoderArgs, RtlSdrOptions, BASE_ARGS};

fn base() -> Vec<String> {
    BASE_ARGS.iter().map(|a| a.to_string()).collect()
}

#[test]
fn no_options_yields_exactly_the_base_flags() {
    assert_eq!(DecoderArgs::new().argv(), base());
    assert_eq!(
        DecoderArgs::new().options(RtlSdrOptions::default()).argv(),
        base()
    );
    assert_eq!(
        base(),
        ["-F", "json", "-M", "utc", "-M", "newmodel", "-M", "level"]
    );
}

#[test]
fn serial_takes_precedence_over_index() {
    let options = RtlSdrOptions {
        device_serial: Some(ArgValue::from("00000042")),
        device_index: Some(1),
        ..RtlSdrOptions::default()
    };

    let argv = DecoderArgs::new().options(options).argv();

    let d = argv.iter().position(|a| a == "-d").expect("-d present");
    assert_eq!(argv[d + 1], ":00000042");
    assert_eq!(argv.iter().filter(|a| *a == "-d").count(), 1);
    assert!(!argv.contains(&"1".to_string()));
}

#[test]
fn index_is_used_when_no_serial() {
    let options = RtlSdrOptions {
        device_index: Some(2),
        ..RtlSdrOptions::default()
    };
    let argv = DecoderArgs::new().options(options).argv();
    assert!(argv.ends_with(&["-d".to_string(), "2".to_string()]));
}

#[test]
fn optional_flags_follow_base_flags_in_order() {
    let options = RtlSdrOptions {
        gain: Some(ArgValue::from(40)),
        device_serial: None,
        device_index: Some(0),
        frequency: Some(ArgValue::from("433.92M")),
        sample_rate: Some(ArgValue::from("250k")),
    };

    let argv = DecoderArgs::new().options(options).argv();

    let mut expected = base();
    expected.extend(
        ["-g", "40", "-d", "0", "-f", "433.92M", "-s", "250k"]
            .iter()
            .map(|a| a.to_string()),
    );
    assert_eq!(argv, expected);
}

#[test]
fn numeric_option_values_deserialize_as_text_arguments() {
    let options: RtlSdrOptions = serde_json::from_str(
        r#"{"gain": 28.6, "frequency": 868000000, "device_serial": "stick-1"}"#,
    )
    .unwrap();

    let argv = DecoderArgs::new().options(options).argv();
    assert!(argv.windows(2).any(|w| w == ["-g", "28.6"]));
    assert!(argv.windows(2).any(|w| w == ["-f", "868000000"]));
    assert!(argv.windows(2).any(|w| w == ["-d", ":stick-1"]));
}

#[test]
fn unknown_radio_keys_are_rejected() {
    let err = serde_json::from_str::<RtlSdrOptions>(r#"{"gian": 40}"#).unwrap_err();
    assert!(err.to_string().contains("gian"));
}
