//! Length-prefixed protobuf frames.

use futures::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use protobuf::Message;

use crate::{Error, Result};

/// Default maximum length of one receiving frame.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 4 * 1024 * 1024;

/// Write one varint length-prefixed protobuf [`Message`].
pub async fn send_message<W, M>(writer: &mut W, message: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let buf = message.write_to_bytes()?;

    let mut payload_len = unsigned_varint::encode::usize_buffer();

    writer
        .write_all(unsigned_varint::encode::usize(buf.len(), &mut payload_len))
        .await?;

    writer.write_all(buf.as_slice()).await?;

    writer.flush().await?;

    log::trace!("send frame, length={}", buf.len());

    Ok(())
}

/// Read one varint length-prefixed protobuf [`Message`].
///
/// # Parameters
/// - `max_recv_len`, the maximum length of the receiving packet.
pub async fn recv_message<R, M>(reader: &mut R, max_recv_len: usize) -> Result<M>
where
    R: AsyncRead + Unpin,
    M: Message,
{
    let body_len = unsigned_varint::aio::read_usize(&mut *reader).await?;

    log::trace!("recv frame, length={}", body_len);

    if body_len > max_recv_len {
        return Err(Error::Overflow(max_recv_len));
    }

    let mut buf = vec![0u8; body_len];

    reader.read_exact(&mut buf).await?;

    Ok(M::parse_from_bytes(&buf)?)
}
