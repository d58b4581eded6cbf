//! Length prefixed framing: 4 bytes of big endian length, then a UTF-8 JSON payload.

use std::io;

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    protocol::{Request, Response},
    service::Service,
};

type LenType = u32;
const LEN_SIZE: usize = size_of::<LenType>();

/// Frames above this size are refused and end the connection.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

fn too_large(len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte limit"),
    )
}

/// Reads 4 bytes of length and then the payload into `buf`.
///
/// # Returns
/// `false` if the peer closed the connection before a new frame started.
pub async fn read_frame<R>(src: &mut R, buf: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncRead + Unpin,
{
    let mut size = [0; LEN_SIZE];
    match src.read_exact(&mut size).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
        Err(e) => return Err(e),
    }

    let len = LenType::from_be_bytes(size) as usize;
    if len > MAX_FRAME_LEN {
        return Err(too_large(len));
    }

    buf.resize(len, 0);
    src.read_exact(buf).await?;
    Ok(true)
}

/// Writes 4 bytes of length and `payload` into `sink`.
pub async fn write_frame<W>(payload: &[u8], sink: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(too_large(payload.len()));
    }

    let len = payload.len() as LenType;
    sink.write_all(&len.to_be_bytes()).await?;
    sink.write_all(payload).await?;
    sink.flush().await
}

/// Answers request frames from `rx` on `tx` until the peer hangs up.
///
/// # Arguments
/// * `rx` - The reading half of the connection.
/// * `tx` - The writing half of the connection.
/// * `service` - Handles every decoded request.
///
/// # Returns
/// `Ok` on a clean close, the I/O or framing error otherwise.
pub async fn serve<R, W>(mut rx: R, mut tx: W, service: &Service) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut inbound = Vec::new();
    let mut outbound = Vec::new();
    let mut served = 0usize;

    while read_frame(&mut rx, &mut inbound).await? {
        let response = service.handle_frame(&inbound);

        outbound.clear();
        serde_json::to_writer(&mut outbound, &response)?;
        write_frame(&outbound, &mut tx).await?;
        served += 1;
    }

    debug!(requests = served; "peer closed the connection");
    Ok(())
}

/// Sends one request and waits for its response.
pub async fn call<R, W>(rx: &mut R, tx: &mut W, request: &Request) -> io::Result<Response>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(request)?;
    write_frame(&payload, tx).await?;

    let mut buf = Vec::new();
    if !read_frame(rx, &mut buf).await? {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before a response arrived",
        ));
    }

    Ok(serde_json::from_slice(&buf)?)
}
