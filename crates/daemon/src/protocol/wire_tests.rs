// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{Request, Response};

#[test]
fn encode_prefixes_big_endian_length() {
    let framed = encode(&Request::Ping).unwrap();
    let body_len = u32::from_be_bytes([framed[0], framed[1], framed[2], framed[3]]) as usize;
    assert_eq!(body_len, framed.len() - 4);
}

#[test]
fn decode_round_trips_and_reports_consumed() {
    let framed = encode(&Request::SessionGet { id: "ses-1".into() }).unwrap();
    let (decoded, consumed): (Request, usize) = decode(&framed).unwrap();
    assert_eq!(decoded, Request::SessionGet { id: "ses-1".into() });
    assert_eq!(consumed, framed.len());
}

#[test]
fn decode_short_buffer_is_closed() {
    assert!(matches!(decode::<Request>(&[0, 0]), Err(ProtocolError::Closed)));
}

#[test]
fn oversized_length_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(u32::MAX).to_be_bytes());
    bytes.extend_from_slice(b"junk");
    assert!(matches!(decode::<Request>(&bytes), Err(ProtocolError::FrameTooLarge(_))));
}

#[tokio::test]
async fn read_write_round_trip_over_a_stream() {
    let (mut client, mut server) = tokio::io::duplex(64 * 1024);

    write_message(&mut client, &Request::Health).await.unwrap();
    let got: Request = read_message(&mut server).await.unwrap().unwrap();
    assert_eq!(got, Request::Health);

    write_message(&mut server, &Response::Pong).await.unwrap();
    let got: Response = read_message(&mut client).await.unwrap().unwrap();
    assert_eq!(got, Response::Pong);
}

#[tokio::test]
async fn clean_eof_reads_none() {
    let (client, mut server) = tokio::io::duplex(1024);
    drop(client);
    let got: Option<Request> = read_message(&mut server).await.unwrap();
    assert!(got.is_none());
}
