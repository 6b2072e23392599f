use std::io::Write;

use bytes::Bytes;
use handspun::http::body::BodyReader;
use handspun::http::buffer::DynBuf;
use handspun::http::response::StatusCode;
use handspun::http::socket::Socket;
use tokio::sync::mpsc;
use tokio_test::io::Builder;

async fn read_all<S: tokio::io::AsyncRead + Unpin>(
    reader: &mut BodyReader,
    socket: &mut Socket<S>,
    buf: &mut DynBuf,
) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let data = reader.read(socket, buf).await.unwrap();
        if data.is_empty() {
            return out;
        }
        out.extend_from_slice(&data);
    }
}

#[tokio::test]
async fn test_length_reader_uses_buffered_bytes_first() {
    let mut socket = Socket::new(Builder::new().read(b"lo wor").build());
    let mut buf = DynBuf::new();
    buf.push(b"hel");

    let mut reader = BodyReader::from_length(9);
    assert_eq!(&reader.read(&mut socket, &mut buf).await.unwrap()[..], b"hel");
    assert_eq!(&reader.read(&mut socket, &mut buf).await.unwrap()[..], b"lo wor");
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_length_reader_leaves_next_request_in_buffer() {
    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();
    buf.push(b"helloGET / HTTP/1.1\r\n\r\n");

    let mut reader = BodyReader::from_length(5);
    assert_eq!(read_all(&mut reader, &mut socket, &mut buf).await, b"hello");
    assert_eq!(buf.as_slice(), b"GET / HTTP/1.1\r\n\r\n");
}

#[tokio::test]
async fn test_length_reader_zero_never_touches_socket() {
    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();

    let mut reader = BodyReader::from_length(0);
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_length_reader_truncated_stream() {
    let mut socket = Socket::new(Builder::new().read(b"abc").build());
    let mut buf = DynBuf::new();

    let mut reader = BodyReader::from_length(10);
    assert_eq!(&reader.read(&mut socket, &mut buf).await.unwrap()[..], b"abc");

    let err = reader.read(&mut socket, &mut buf).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BadRequest));
    assert_eq!(err.to_string(), "Unexpected EOF");
}

#[tokio::test]
async fn test_memory_reader_yields_once() {
    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();

    let mut reader = BodyReader::from_memory("hello world\n");
    assert_eq!(reader.length(), Some(12));
    assert_eq!(&reader.read(&mut socket, &mut buf).await.unwrap()[..], b"hello world\n");
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_channel_reader_streams_until_sender_drops() {
    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();
    let (tx, rx) = mpsc::channel(4);

    tx.send(Bytes::from_static(b"0\n")).await.unwrap();
    tx.send(Bytes::new()).await.unwrap();
    tx.send(Bytes::from_static(b"1\n")).await.unwrap();
    drop(tx);

    let mut reader = BodyReader::from_channel(rx);
    assert_eq!(reader.length(), None);
    assert_eq!(read_all(&mut reader, &mut socket, &mut buf).await, b"0\n1\n");
}

fn temp_file_with(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_file_reader_reads_declared_size() {
    let contents: Vec<u8> = (0..40_000u32).map(|i| i as u8).collect();
    let tmp = temp_file_with(&contents);
    let file = tokio::fs::File::open(tmp.path()).await.unwrap();

    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();
    let mut reader = BodyReader::from_file(file, contents.len() as u64);

    assert_eq!(reader.length(), Some(40_000));
    assert_eq!(read_all(&mut reader, &mut socket, &mut buf).await, contents);
    reader.close().await;
    reader.close().await;
    assert!(reader.read(&mut socket, &mut buf).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_reader_shorter_than_declared() {
    let tmp = temp_file_with(b"short");
    let file = tokio::fs::File::open(tmp.path()).await.unwrap();

    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();
    let mut reader = BodyReader::from_file(file, 10);

    assert_eq!(&reader.read(&mut socket, &mut buf).await.unwrap()[..], b"short");
    let err = reader.read(&mut socket, &mut buf).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::InternalServerError));
    reader.close().await;
}

#[tokio::test]
async fn test_file_reader_longer_than_declared() {
    let tmp = temp_file_with(b"longer than declared");
    let file = tokio::fs::File::open(tmp.path()).await.unwrap();

    let mut socket = Socket::new(Builder::new().build());
    let mut buf = DynBuf::new();
    let mut reader = BodyReader::from_file(file, 3);

    let err = reader.read(&mut socket, &mut buf).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::InternalServerError));
    reader.close().await;
}
