//! Socket identity allocation

use uuid::Uuid;

use super::socket::SocketId;
use crate::config::SocketSettings;

/// Returns `existing` unchanged when it is non-blank, otherwise mints a fresh id
pub fn generate_socket_id(existing: Option<&str>) -> SocketId {
    generate_socket_id_with(existing, SocketSettings::global())
}

/// Same as [`generate_socket_id`] with explicit settings for the id prefix.
///
/// Fresh ids are `<prefix>-<uuid v4>`; 122 random bits make collisions within a
/// process negligible.
pub fn generate_socket_id_with(existing: Option<&str>, settings: &SocketSettings) -> SocketId {
    match existing {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => format!("{}-{}", settings.socket_id_prefix, Uuid::new_v4().simple()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_existing_id_is_preserved() {
        assert_eq!(generate_socket_id(Some("socket-1")), "socket-1");
    }

    #[test]
    fn test_blank_existing_id_is_replaced() {
        let id = generate_socket_id(Some("   "));
        assert!(id.starts_with("socket-"));
        assert!(generate_socket_id(Some("")).starts_with("socket-"));
        assert!(generate_socket_id(None).starts_with("socket-"));
    }

    #[test]
    fn test_ten_thousand_ids_are_distinct() {
        let ids: HashSet<SocketId> = (0..10_000).map(|_| generate_socket_id(None)).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_custom_prefix() {
        let settings = SocketSettings {
            socket_id_prefix: "pin".into(),
            ..SocketSettings::default()
        };
        assert!(generate_socket_id_with(None, &settings).starts_with("pin-"));
    }

    proptest! {
        #[test]
        fn non_blank_ids_round_trip(id in "[a-zA-Z0-9_-]{1,32}") {
            prop_assert_eq!(generate_socket_id(Some(&id)), id);
        }
    }
}
