//! Room server: listen socket, accept loop and process orchestration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::common::endpoint::room_listen_addr;
use crate::common::time::get_jst_timestamp;
use crate::error::ServerError;

use super::domain::{ConnectionId, Nickname, Participant, ParticipantId, Timestamp};
use super::handler::handle_connection;
use super::host_input::{run_host_input, spawn_host_input};
use super::registry::Outbox;
use super::signal::watch_ctrl_c;
use super::state::RoomState;

/// Time given to connection tasks to flush the farewell onto their sockets
/// before the process goes away
const CLOSE_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// A bound room ready to accept participants
pub struct RoomServer {
    listener: TcpListener,
    state: Arc<RoomState>,
}

impl RoomServer {
    /// Bind the listen socket and register the host as the room's first
    /// participant.
    ///
    /// # Arguments
    ///
    /// * `port` - The port to listen on; 0 lets the OS pick one
    /// * `host_nickname` - The nickname the host appears under
    pub async fn bind(port: u16, host_nickname: Nickname) -> Result<Self, ServerError> {
        let addr = room_listen_addr(port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let state = Arc::new(RoomState::new());
        {
            let mut registry = state.registry.lock().await;
            let host = Participant::host(
                host_nickname,
                local_addr,
                Timestamp::new(get_jst_timestamp()),
            );
            registry.register(ParticipantId::Host, host, Outbox::Console);
        }

        Ok(Self { listener, state })
    }

    /// Get the local address the room is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get a handle to the shared room state
    pub fn state(&self) -> Arc<RoomState> {
        self.state.clone()
    }

    /// Accept participants until the room closes.
    ///
    /// Each accepted connection gets an ID from a monotonic counter and its
    /// own task. Accept failures are logged and retried after a short pause.
    pub async fn run(self) {
        let mut shutdown_rx = self.state.subscribe_shutdown();
        let mut next_connection_id: u64 = 1;

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, peer_addr)) => {
                        let connection_id = ConnectionId::new(next_connection_id);
                        next_connection_id += 1;
                        tracing::debug!("Accepted connection '{}' from {}", connection_id, peer_addr);
                        tokio::spawn(handle_connection(
                            stream,
                            peer_addr,
                            connection_id,
                            self.state.clone(),
                        ));
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept a connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                result = shutdown_rx.changed() => match result {
                    Ok(()) => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Room closed; stopping the accept loop");
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::error!("Shutdown channel dropped; stopping the accept loop");
                        break;
                    }
                },
            }
        }

        // Stop accepting right away; the grace period lets connection tasks
        // flush the farewell onto their sockets.
        drop(self.listener);
        tokio::time::sleep(CLOSE_GRACE_PERIOD).await;
    }
}

/// Run the chat room server
///
/// Binds the room, starts the host console input and the Ctrl+C watcher,
/// then accepts participants until the room closes.
///
/// # Arguments
///
/// * `port` - The port number to bind to (e.g., 8080)
/// * `host_nickname` - The nickname the host appears under
pub async fn run_server(
    port: u16,
    host_nickname: Nickname,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = RoomServer::bind(port, host_nickname.clone()).await?;
    let local_addr = server.local_addr()?;
    let state = server.state();

    tracing::info!("Chat room listening on {}", local_addr);
    tracing::info!(
        "Clients can join with: client --host <ip> --port {}",
        local_addr.port()
    );
    tracing::info!("Press Ctrl+C or type /close to close the room");

    println!(
        "Room is open. You are '{}'. Type /help to list commands, /close to close the room.",
        host_nickname
    );

    let host_input_task = tokio::spawn(run_host_input(state.clone(), spawn_host_input()));
    let signal_task = tokio::spawn(watch_ctrl_c(state.clone()));

    server.run().await;

    host_input_task.abort();
    signal_task.abort();

    tracing::info!("Room closed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::domain::PermissionLevel;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::TcpStream;
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::time::timeout;

    const READ_TIMEOUT: Duration = Duration::from_secs(2);

    /// A raw TCP participant for driving the room from the outside
    struct TestPeer {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl TestPeer {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            let (read_half, writer) = stream.into_split();
            Self {
                lines: BufReader::new(read_half).lines(),
                writer,
            }
        }

        async fn send_line(&mut self, line: &str) {
            self.writer
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .unwrap();
        }

        async fn read_line(&mut self) -> String {
            timeout(READ_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for a line")
                .unwrap()
                .expect("connection closed before a line arrived")
        }

        async fn read_eof(&mut self) {
            let result = timeout(READ_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for EOF")
                .unwrap();
            assert!(result.is_none());
        }
    }

    async fn start_test_room() -> (SocketAddr, Arc<RoomState>, tokio::task::JoinHandle<()>) {
        let server = RoomServer::bind(0, Nickname::new("host").unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let state = server.state();
        let run_handle = tokio::spawn(server.run());
        (addr, state, run_handle)
    }

    #[tokio::test]
    async fn test_bind_registers_host_with_listen_address() {
        // テスト項目: バインド時にホストがリッスンアドレス付きで登録される
        // given (前提条件):
        let server = RoomServer::bind(0, Nickname::new("host").unwrap())
            .await
            .unwrap();

        // when (操作):
        let state = server.state();
        let registry = state.registry.lock().await;

        // then (期待する結果):
        assert_eq!(registry.len(), 1);
        let host = registry.get(ParticipantId::Host).unwrap();
        assert_eq!(host.nickname.as_str(), "host");
        assert_eq!(host.permission, PermissionLevel::HOST);
        assert_eq!(
            host.peer_port,
            server.local_addr().unwrap().port().to_string()
        );
    }

    #[tokio::test]
    async fn test_first_connection_receives_welcome() {
        // テスト項目: 最初の接続がデフォルトニックネーム入りのウェルカムを受け取る
        // given (前提条件):
        let (addr, _state, _run_handle) = start_test_room().await;

        // when (操作):
        let mut peer = TestPeer::connect(addr).await;

        // then (期待する結果):
        assert_eq!(
            peer.read_line().await,
            "Welcome! You are 'guest-1'. Type /help to list commands."
        );
    }

    #[tokio::test]
    async fn test_join_notice_excludes_the_newcomer() {
        // テスト項目: 入室通知が新規参加者自身には配信されない
        // given (前提条件):
        let (addr, _state, _run_handle) = start_test_room().await;
        let mut first = TestPeer::connect(addr).await;
        first.read_line().await; // welcome for guest-1

        // when (操作):
        let mut second = TestPeer::connect(addr).await;

        // then (期待する結果): 既存参加者には通知が届く
        let notice = first.read_line().await;
        assert!(notice.starts_with("* guest-2 entered the room at "));

        // then (期待する結果): 新規参加者のウェルカムの次の行は自分の入室通知ではない
        second.read_line().await; // welcome for guest-2
        first.send_line("hi").await;
        assert_eq!(second.read_line().await, "+ [guest-1]: hi");
    }

    #[tokio::test]
    async fn test_chat_is_not_echoed_to_the_sender() {
        // テスト項目: チャット行が送信者自身のソケットに戻らない
        // given (前提条件):
        let (addr, _state, _run_handle) = start_test_room().await;
        let mut sender = TestPeer::connect(addr).await;
        sender.read_line().await; // welcome for guest-1
        let mut receiver = TestPeer::connect(addr).await;
        receiver.read_line().await; // welcome for guest-2
        sender.read_line().await; // entered notice for guest-2

        // when (操作):
        sender.send_line("hello").await;
        sender.send_line("/users").await;

        // then (期待する結果): 受信者にはチャットが届く
        assert_eq!(receiver.read_line().await, "+ [guest-1]: hello");

        // then (期待する結果): 送信者の次の行は自分のチャットではなく /users の応答になる
        assert_eq!(sender.read_line().await, "Participants (3):");
    }

    #[tokio::test]
    async fn test_leave_notice_is_broadcast_on_disconnect() {
        // テスト項目: 切断時に退室通知が残りの参加者へ配信される
        // given (前提条件):
        let (addr, _state, _run_handle) = start_test_room().await;
        let mut observer = TestPeer::connect(addr).await;
        observer.read_line().await; // welcome for guest-1
        let leaver = TestPeer::connect(addr).await;
        observer.read_line().await; // entered notice for guest-2

        // when (操作):
        drop(leaver);

        // then (期待する結果):
        let notice = observer.read_line().await;
        assert!(notice.starts_with("* guest-2 left the room at "));
    }

    #[tokio::test]
    async fn test_close_room_sends_farewell_then_disconnects_everyone() {
        // テスト項目: 閉室で全参加者に別れの通知が届き、接続が閉じられる
        // given (前提条件):
        let (addr, state, run_handle) = start_test_room().await;
        let mut peer = TestPeer::connect(addr).await;
        peer.read_line().await; // welcome for guest-1

        // when (操作):
        state.close_room().await;

        // then (期待する結果): 別れの通知に続いて EOF になる
        assert_eq!(
            peer.read_line().await,
            "* The host is closing the room. Goodbye!"
        );
        peer.read_eof().await;

        // then (期待する結果): 受付ループが終了し、新規接続はできない
        run_handle.await.unwrap();
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
