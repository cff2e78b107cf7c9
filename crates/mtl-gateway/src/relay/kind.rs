//! Message kind translation, one explicit table per direction.

use mtl_proto::v1::MessageType;

pub const USER_MESSAGE: &str = "USER_MESSAGE";
pub const AGENT_RESPONSE: &str = "AGENT_RESPONSE";
pub const ERROR: &str = "ERROR";
pub const CLOSE: &str = "CLOSE";
pub const UNKNOWN: &str = "UNKNOWN";

/// Backend kind to the `type` string sent to the client.
pub const fn backend_to_client(kind: MessageType) -> &'static str {
    match kind {
        MessageType::AgentResponse => AGENT_RESPONSE,
        MessageType::Error => ERROR,
        MessageType::Close => CLOSE,
        MessageType::Unspecified | MessageType::Initialize | MessageType::UserMessage => UNKNOWN,
    }
}

/// Client `type` string to the backend kind. `None` means the message is
/// not something a client may send and must be dropped.
pub fn client_to_backend(kind: &str) -> Option<MessageType> {
    match kind {
        USER_MESSAGE => Some(MessageType::UserMessage),
        CLOSE => Some(MessageType::Close),
        _ => None,
    }
}
