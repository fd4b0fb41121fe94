//! Domain types for the room: participant identity, nicknames, roles and
//! permissions.
//!
//! This module contains pure types with no I/O, making them easy to test.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

/// Maximum number of characters allowed in a nickname
pub const MAX_NICKNAME_LEN: usize = 20;

/// Role prefix shown before the host's nickname in chat lines
pub const HOST_PREFIX: &str = "@";

/// Role prefix shown before a guest's nickname in chat lines
pub const GUEST_PREFIX: &str = "+";

/// Identifier for an accepted TCP connection, unique for the lifetime of the
/// server process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a connection ID from a raw sequence number
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw sequence number
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a room participant.
///
/// The host participates through the server console rather than a socket, so
/// it gets its own variant. Ordering puts the host first, then connections in
/// ascending accept order; the roster relies on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticipantId {
    /// The hosting console
    Host,
    /// An accepted TCP connection
    Connection(ConnectionId),
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantId::Host => write!(f, "host"),
            ParticipantId::Connection(id) => write!(f, "conn-{}", id),
        }
    }
}

/// Nickname validation errors
#[derive(Debug, Error, PartialEq)]
pub enum NicknameError {
    /// The nickname is empty
    #[error("Nickname must not be empty")]
    Empty,

    /// The nickname exceeds the maximum length
    #[error("Nickname must be at most {max} characters", max = MAX_NICKNAME_LEN)]
    TooLong,

    /// The nickname contains a space character
    #[error("Nickname must not contain spaces")]
    ContainsSpace,
}

/// A validated nickname: 1 to [`MAX_NICKNAME_LEN`] characters, no spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nickname(String);

impl Nickname {
    /// Validate and create a nickname
    pub fn new(name: &str) -> Result<Self, NicknameError> {
        if name.is_empty() {
            return Err(NicknameError::Empty);
        }
        if name.chars().count() > MAX_NICKNAME_LEN {
            return Err(NicknameError::TooLong);
        }
        if name.contains(' ') {
            return Err(NicknameError::ContainsSpace);
        }
        Ok(Self(name.to_string()))
    }

    /// Default nickname assigned to a connection when it is accepted
    pub fn guest(id: ConnectionId) -> Self {
        Self(format!("guest-{}", id.value()))
    }

    /// Get the nickname as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Permission level of a participant, 0 to 5.
///
/// 5 is the host with full privileges; 0 is an unprivileged guest. Levels in
/// between are reserved for future gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PermissionLevel(u8);

impl PermissionLevel {
    /// Unprivileged guest level
    pub const GUEST: PermissionLevel = PermissionLevel(0);

    /// Host level with full privileges
    pub const HOST: PermissionLevel = PermissionLevel(5);

    /// Create a permission level from a raw value
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw level
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether this level allows changing the own nickname
    pub fn can_rename(&self) -> bool {
        self.0 >= 1
    }
}

/// Unix timestamp in JST milliseconds wrapped for the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Wrap a raw JST millisecond timestamp
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Get the raw millisecond value
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Registry record of one room participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Current nickname, mutated only by a rename
    pub nickname: Nickname,
    /// IP address of the participant's endpoint
    pub peer_ip: String,
    /// Port of the participant's endpoint
    pub peer_port: String,
    /// Role prefix shown before the nickname in chat lines
    pub role_prefix: String,
    /// Permission level, 0 to 5
    pub permission: PermissionLevel,
    /// When the participant entered the room (JST milliseconds)
    pub connected_at: Timestamp,
}

impl Participant {
    /// Build the host record. The host has no peer socket, so its endpoint is
    /// the room's own listen address.
    pub fn host(nickname: Nickname, listen_addr: SocketAddr, connected_at: Timestamp) -> Self {
        Self {
            nickname,
            peer_ip: listen_addr.ip().to_string(),
            peer_port: listen_addr.port().to_string(),
            role_prefix: HOST_PREFIX.to_string(),
            permission: PermissionLevel::HOST,
            connected_at,
        }
    }

    /// Build the record for a freshly accepted connection
    pub fn connection(id: ConnectionId, peer_addr: SocketAddr, connected_at: Timestamp) -> Self {
        Self {
            nickname: Nickname::guest(id),
            peer_ip: peer_addr.ip().to_string(),
            peer_port: peer_addr.port().to_string(),
            role_prefix: GUEST_PREFIX.to_string(),
            permission: PermissionLevel::GUEST,
            connected_at,
        }
    }

    /// The participant's endpoint as `"ip:port"`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.peer_ip, self.peer_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_exposes_raw_value() {
        // テスト項目: ConnectionId が元の連番を返す
        // given (前提条件):
        let id = ConnectionId::new(42);

        // when (操作):
        let value = id.value();

        // then (期待する結果):
        assert_eq!(value, 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_participant_id_orders_host_first() {
        // テスト項目: ParticipantId の順序でホストが先頭になる
        // given (前提条件):
        let mut ids = vec![
            ParticipantId::Connection(ConnectionId::new(2)),
            ParticipantId::Host,
            ParticipantId::Connection(ConnectionId::new(1)),
        ];

        // when (操作):
        ids.sort();

        // then (期待する結果):
        assert_eq!(
            ids,
            vec![
                ParticipantId::Host,
                ParticipantId::Connection(ConnectionId::new(1)),
                ParticipantId::Connection(ConnectionId::new(2)),
            ]
        );
    }

    #[test]
    fn test_participant_id_display() {
        // テスト項目: ParticipantId が表示用の識別子に変換される
        // given (前提条件):
        let host = ParticipantId::Host;
        let connection = ParticipantId::Connection(ConnectionId::new(3));

        // when (操作):
        let host_label = host.to_string();
        let connection_label = connection.to_string();

        // then (期待する結果):
        assert_eq!(host_label, "host");
        assert_eq!(connection_label, "conn-3");
    }

    #[test]
    fn test_nickname_accepts_valid_name() {
        // テスト項目: 有効な名前からニックネームを作成できる
        // given (前提条件):
        let name = "alice";

        // when (操作):
        let nickname = Nickname::new(name).unwrap();

        // then (期待する結果):
        assert_eq!(nickname.as_str(), "alice");
    }

    #[test]
    fn test_nickname_accepts_max_length_name() {
        // テスト項目: 最大長ちょうどの名前が受理される
        // given (前提条件):
        let name = "a".repeat(MAX_NICKNAME_LEN);

        // when (操作):
        let result = Nickname::new(&name);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_nickname_rejects_empty_name() {
        // テスト項目: 空の名前が拒否される
        // given (前提条件):
        let name = "";

        // when (操作):
        let result = Nickname::new(name);

        // then (期待する結果):
        assert_eq!(result, Err(NicknameError::Empty));
    }

    #[test]
    fn test_nickname_rejects_too_long_name() {
        // テスト項目: 最大長を超える名前が拒否される
        // given (前提条件):
        let name = "a".repeat(MAX_NICKNAME_LEN + 1);

        // when (操作):
        let result = Nickname::new(&name);

        // then (期待する結果):
        assert_eq!(result, Err(NicknameError::TooLong));
    }

    #[test]
    fn test_nickname_rejects_name_with_space() {
        // テスト項目: 空白を含む名前が拒否される
        // given (前提条件):
        let name = "alice smith";

        // when (操作):
        let result = Nickname::new(name);

        // then (期待する結果):
        assert_eq!(result, Err(NicknameError::ContainsSpace));
    }

    #[test]
    fn test_nickname_counts_characters_not_bytes() {
        // テスト項目: 長さ制限がバイト数ではなく文字数で判定される
        // given (前提条件):
        // 20 characters, 60 bytes in UTF-8
        let name = "あ".repeat(MAX_NICKNAME_LEN);

        // when (操作):
        let result = Nickname::new(&name);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_guest_nickname_derives_from_connection_id() {
        // テスト項目: デフォルトニックネームが接続 ID から生成される
        // given (前提条件):
        let id = ConnectionId::new(7);

        // when (操作):
        let nickname = Nickname::guest(id);

        // then (期待する結果):
        assert_eq!(nickname.as_str(), "guest-7");
    }

    #[test]
    fn test_nickname_error_messages() {
        // テスト項目: バリデーションエラーの文言が利用者向けの説明になっている
        // given (前提条件):

        // when (操作):
        let empty = NicknameError::Empty.to_string();
        let too_long = NicknameError::TooLong.to_string();
        let contains_space = NicknameError::ContainsSpace.to_string();

        // then (期待する結果):
        assert_eq!(empty, "Nickname must not be empty");
        assert_eq!(too_long, "Nickname must be at most 20 characters");
        assert_eq!(contains_space, "Nickname must not contain spaces");
    }

    #[test]
    fn test_permission_level_guest_cannot_rename() {
        // テスト項目: ゲストのレベル 0 ではニックネーム変更が許可されない
        // given (前提条件):
        let permission = PermissionLevel::GUEST;

        // when (操作):
        let allowed = permission.can_rename();

        // then (期待する結果):
        assert!(!allowed);
    }

    #[test]
    fn test_permission_level_one_and_above_can_rename() {
        // テスト項目: レベル 1 以上でニックネーム変更が許可される
        // given (前提条件):
        let lowest_allowed = PermissionLevel::new(1);
        let host = PermissionLevel::HOST;

        // when (操作):
        let lowest_result = lowest_allowed.can_rename();
        let host_result = host.can_rename();

        // then (期待する結果):
        assert!(lowest_result);
        assert!(host_result);
    }

    #[test]
    fn test_host_participant_record() {
        // テスト項目: ホストのレコードがリッスンアドレスと最高権限を持つ
        // given (前提条件):
        let nickname = Nickname::new("host").unwrap();
        let listen_addr = "0.0.0.0:8080".parse().unwrap();

        // when (操作):
        let participant = Participant::host(nickname, listen_addr, Timestamp::new(1000));

        // then (期待する結果):
        assert_eq!(participant.nickname.as_str(), "host");
        assert_eq!(participant.endpoint(), "0.0.0.0:8080");
        assert_eq!(participant.role_prefix, HOST_PREFIX);
        assert_eq!(participant.permission, PermissionLevel::HOST);
        assert_eq!(participant.connected_at, Timestamp::new(1000));
    }

    #[test]
    fn test_connection_participant_record() {
        // テスト項目: 接続のレコードがデフォルトニックネームとゲスト権限を持つ
        // given (前提条件):
        let id = ConnectionId::new(1);
        let peer_addr = "192.168.1.10:54321".parse().unwrap();

        // when (操作):
        let participant = Participant::connection(id, peer_addr, Timestamp::new(2000));

        // then (期待する結果):
        assert_eq!(participant.nickname.as_str(), "guest-1");
        assert_eq!(participant.endpoint(), "192.168.1.10:54321");
        assert_eq!(participant.role_prefix, GUEST_PREFIX);
        assert_eq!(participant.permission, PermissionLevel::GUEST);
        assert_eq!(participant.connected_at, Timestamp::new(2000));
    }
}
