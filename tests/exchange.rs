//! Full request/response exchanges against responses recorded from a
//! TRM-series temperature controller at unit address 1.

use anyhow::{anyhow, Result};
use owen_proto::codec::{self, StrBytes};
use owen_proto::{
    AddressMode, Error, Master, Mnemonic, ParamValue, ReceiveResult, Response, Unit, WireType,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn trm() -> Master {
    Master::new(Unit::new(1, AddressMode::Bits8).unwrap())
}

/// Drive one full read exchange: check the request bytes, feed the
/// recorded answer byte by byte, return the validated response.
fn read_exchange(
    name: &str,
    index: Option<u16>,
    expect_request: &[u8],
    answer: &[u8],
) -> Result<Response> {
    let mnemonic: Mnemonic = name.parse()?;
    let send = trm().read_parameter(mnemonic, index)?;
    assert_eq!(send.as_slice(), expect_request, "request for {}", name);

    let mut recv = send.data_sent();
    let (last, head) = answer.split_last().ok_or_else(|| anyhow!("empty answer"))?;
    for byte in head {
        recv = match recv.receive_data(&[*byte]) {
            ReceiveResult::NeedData(r) => r,
            ReceiveResult::Done(d) => return Err(anyhow!("finished early: {:?}", d)),
        };
    }
    match recv.receive_data(&[*last]) {
        ReceiveResult::Done(result) => Ok(result?),
        ReceiveResult::NeedData(_) => Err(anyhow!("answer not recognized as complete")),
    }
}

fn payload_of(response: Response) -> Result<Vec<u8>> {
    match response {
        Response::Payload(p) => Ok(p.to_vec()),
        other => Err(anyhow!("expected payload, got {:?}", other)),
    }
}

#[test]
fn read_device_name() -> Result<()> {
    init_logging();
    let resp = read_exchange(
        "DEV",
        None,
        b"#GHHGTMOHHRTO\r",
        b"#GHGMTMOHJHJGJISSTGTIPLKK\r",
    )?;
    let payload = payload_of(resp)?;
    let value = codec::unpack_reply(WireType::Str, &payload, false)?;
    // Device type string, stored byte-reversed on the wire.
    let expected: StrBytes = b"\xd2\xd0\xcc201".iter().copied().collect();
    assert_eq!(value, ParamValue::Str(expected));
    Ok(())
}

#[test]
fn read_u8_without_index() -> Result<()> {
    init_logging();
    let resp = read_exchange("A.LEN", None, b"#GHHGHUTIKGJI\r", b"#GHGHHUTIGGJKGK\r")?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::U8, &payload, false)?,
        ParamValue::U8(0)
    );
    Ok(())
}

#[test]
fn read_u8_with_index() -> Result<()> {
    init_logging();
    let resp = read_exchange(
        "DP",
        Some(0),
        b"#GHHIRJURGGGGHQIV\r",
        b"#GHGJRJURGHGGGGQROU\r",
    )?;
    let payload = payload_of(resp)?;
    assert_eq!(payload, [1, 0, 0]); // value plus echoed index pair
    assert_eq!(
        codec::unpack_reply(WireType::U8, &payload, true)?,
        ParamValue::U8(1)
    );
    Ok(())
}

#[test]
fn read_u16() -> Result<()> {
    init_logging();
    let resp = read_exchange("ADDR", None, b"#GHHGPVMIJIMK\r", b"#GHGIPVMIGGGHNHIR\r")?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::U16, &payload, false)?,
        ParamValue::U16(1)
    );
    Ok(())
}

#[test]
fn read_f24_process_value() -> Result<()> {
    init_logging();
    let resp = read_exchange("PV", None, b"#GHHGROTVJNPQ\r", b"#GHGJROTVKIQJIOOJKN\r")?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::F24, &payload, false)?,
        ParamValue::F24(81.578_125)
    );
    Ok(())
}

#[test]
fn read_f24_with_index() -> Result<()> {
    init_logging();
    let resp = read_exchange(
        "SL.H",
        Some(0),
        b"#GHHIUSIGGGGGTJIT\r",
        b"#GHGLUSIGKKJROGGGGGPVUS\r",
    )?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::F24, &payload, true)?,
        ParamValue::F24(750.0)
    );
    Ok(())
}

#[test]
fn read_u24_error_register() -> Result<()> {
    init_logging();
    let resp = read_exchange("N.ERR", None, b"#GHHGGIJJRIQN\r", b"#GHGJGIJJKNRKMLLNJK\r")?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::U24, &payload, false)?,
        ParamValue::U24(71, 46181)
    );
    Ok(())
}

#[test]
fn write_acknowledged_by_echo() -> Result<()> {
    init_logging();
    for (name, index, value, request) in [
        ("A.LEN", None, ParamValue::U8(0), &b"#GHGHHUTIGGJKGK\r"[..]),
        ("CMP", Some(0), ParamValue::U8(1), b"#GHGJQLQRGHGGGGPNOJ\r"),
        ("ADDR", None, ParamValue::U16(1), b"#GHGIPVMIGGGHNHIR\r"),
        ("R.OUT", None, ParamValue::F24(0.0), b"#GHGJPPKMGGGGGGQMGJ\r"),
        ("SL.H", Some(0), ParamValue::F24(750.0), b"#GHGLUSIGKKJROGGGGGPVUS\r"),
    ] {
        let send = trm().write_parameter(name.parse()?, index, &value)?;
        assert_eq!(send.as_slice(), request, "request for {}", name);
        let echo = send.as_slice().to_vec();
        match send.data_sent().receive_data(&echo) {
            ReceiveResult::Done(Ok(Response::Ack)) => {}
            other => return Err(anyhow!("{}: unexpected result {:?}", name, other)),
        }
    }
    Ok(())
}

#[test]
fn device_error_reported_via_hash_substitution() -> Result<()> {
    init_logging();
    let resp = read_exchange("CTL", None, b"#GHHGNNRQLVUQ\r", b"#GHGJGIJJKNNNRQPUSV\r")?;
    assert_eq!(resp, Response::DeviceError { code: 0x47 });
    Ok(())
}

#[test]
fn single_error_byte_instead_of_value() -> Result<()> {
    init_logging();
    // A one-byte payload that can't be an F32 is the device's error code.
    let resp = read_exchange("REST", None, b"#GHHGJONIJKMN\r", b"#GHGHJONIMKKIMP\r")?;
    let payload = payload_of(resp)?;
    assert_eq!(
        codec::unpack_reply(WireType::F32, &payload, false),
        Err(Error::Device { code: 100 })
    );
    // Read as the U8 it actually is, the same payload is a value.
    assert_eq!(
        codec::unpack_reply(WireType::U8, &payload, false)?,
        ParamValue::U8(100)
    );
    Ok(())
}

#[test]
fn corrupted_answer_is_a_checksum_error() {
    init_logging();
    let send = trm().read_parameter("A.LEN".parse().unwrap(), None).unwrap();
    // Valid answer with one payload symbol flipped, checksum untouched.
    let mut answer = b"#GHGHHUTIGGJKGK\r".to_vec();
    answer[9] = b'H';
    match send.data_sent().receive_data(&answer) {
        ReceiveResult::Done(Err(Error::Checksum { .. })) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn truncated_answer_is_a_format_error() {
    init_logging();
    let send = trm().read_parameter("A.LEN".parse().unwrap(), None).unwrap();
    match send.data_sent().receive_data(b"#GHGHHUTIGGJKG\r") {
        ReceiveResult::Done(Err(Error::Format { .. })) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}
