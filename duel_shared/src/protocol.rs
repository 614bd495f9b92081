//! Wire protocol.
//!
//! One reliable TCP channel per session carries every message in both
//! directions as a length-prefixed JSON frame. All client messages are
//! fire-and-forget; the host never acknowledges them individually and
//! instead rebroadcasts the room snapshot they produced.

use anyhow::Context;
use bytes::{BufMut, BytesMut};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time,
};

use crate::{math::Vec3, room::Room};

/// Protocol version for compatibility checks.
pub const PROTOCOL_VERSION: u32 = 1;

static NEXT_SESSION_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies one connected session; assigned by the host during handshake.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SessionId(pub u32);

impl SessionId {
    pub fn new_unique() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Client → host messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ClientMsg {
    /// Handshake opener; the host answers with `Welcome`.
    Hello { protocol: u32 },

    /// Request to enter a room; sent once per join attempt.
    JoinRoom { room_id: String },

    /// Accepted local displacement.
    Move {
        room_id: String,
        position: Vec3,
        rotation_y: f32,
    },

    /// Successful attack entry.
    Attack { room_id: String },

    /// Guard edge, press and release.
    Block { room_id: String, is_blocking: bool },

    /// Locally-resolved hit on the named target.
    UpdateHealth {
        room_id: String,
        target: SessionId,
        damage: f32,
    },
}

/// Host → client messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HostMsg {
    /// Handshake reply carrying the session's identity.
    Welcome { session_id: SessionId },

    /// Authoritative snapshot of every participant in the room.
    UpdateRoom(Room),

    /// Join rejected: the room already holds two combatants.
    RoomFull,

    /// Match decided; `winner` names the surviving session.
    GameOver { winner: SessionId },
}

/// Reliable connection over TCP with length-prefixed frames.
#[derive(Debug)]
pub struct Channel {
    stream: TcpStream,
}

impl Channel {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        Ok(Self::new(stream))
    }

    pub async fn send<M: Serialize>(&mut self, msg: &M) -> anyhow::Result<()> {
        let payload = serde_json::to_vec(msg).context("serialize msg")?;
        let mut buf = BytesMut::with_capacity(4 + payload.len());
        buf.put_u32(payload.len() as u32);
        buf.extend_from_slice(&payload);
        self.stream.write_all(&buf).await.context("tcp write")?;
        Ok(())
    }

    pub async fn recv<M: DeserializeOwned>(&mut self) -> anyhow::Result<M> {
        let mut len_buf = [0u8; 4];
        self.stream
            .read_exact(&mut len_buf)
            .await
            .context("tcp read len")?;
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        self.stream
            .read_exact(&mut payload)
            .await
            .context("tcp read payload")?;
        let msg = serde_json::from_slice(&payload).context("deserialize msg")?;
        Ok(msg)
    }

    /// Receives a frame within the given timeout.
    pub async fn recv_timeout<M: DeserializeOwned>(
        &mut self,
        timeout: Duration,
    ) -> anyhow::Result<Option<M>> {
        match time::timeout(timeout, self.recv()).await {
            Ok(Ok(msg)) => Ok(Some(msg)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    pub fn peer_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.stream.peer_addr()?)
    }
}

/// TCP listener for the host side.
pub struct Listener {
    listener: TcpListener,
}

impl Listener {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await.context("tcp bind")?;
        Ok(Self { listener })
    }

    pub async fn accept(&self) -> anyhow::Result<(Channel, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await.context("tcp accept")?;
        Ok((Channel::new(stream), addr))
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

/// Convenience codec helpers.
pub fn encode_to_bytes<M: Serialize>(msg: &M) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(msg).context("serialize")
}

pub fn decode_from_bytes<M: DeserializeOwned>(b: &[u8]) -> anyhow::Result<M> {
    serde_json::from_slice(b).context("deserialize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_msg_roundtrip_bytes() {
        let msg = ClientMsg::Move {
            room_id: "R1".to_string(),
            position: Vec3::new(-9.75, 2.0, 0.0),
            rotation_y: 0.5,
        };
        let bytes = encode_to_bytes(&msg).unwrap();
        let back: ClientMsg = decode_from_bytes(&bytes).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn host_msg_roundtrip_bytes() {
        let mut room = Room::new("R1");
        room.add_participant(SessionId(7)).unwrap();
        room.add_participant(SessionId(9)).unwrap();
        room.started = true;

        let msg = HostMsg::UpdateRoom(room);
        let bytes = encode_to_bytes(&msg).unwrap();
        let back: HostMsg = decode_from_bytes(&bytes).unwrap();
        assert_eq!(msg, back);
    }
}
