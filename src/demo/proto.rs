// デモ内のネットメッセージ (protobuf)
// CS:GOとCS2で共通のレイアウトのものだけを定義する

use prost::Message;

// ---- ConVar (net_SetConVar) ----

#[derive(Clone, PartialEq, Message)]
pub struct ConVar {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ConVars {
    #[prost(message, repeated, tag = "1")]
    pub cvars: Vec<ConVar>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetConVar {
    #[prost(message, optional, tag = "1")]
    pub convars: Option<ConVars>,
}

// ---- ゲームイベント ----

#[derive(Clone, PartialEq, Message)]
pub struct DescriptorKey {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct EventDescriptor {
    #[prost(int32, tag = "1")]
    pub event_id: i32,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "3")]
    pub keys: Vec<DescriptorKey>,
}

/// svc_GameEventList / GE_Source1LegacyGameEventList
#[derive(Clone, PartialEq, Message)]
pub struct GameEventList {
    #[prost(message, repeated, tag = "1")]
    pub descriptors: Vec<EventDescriptor>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EventKey {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(string, optional, tag = "2")]
    pub val_string: Option<String>,
    #[prost(float, optional, tag = "3")]
    pub val_float: Option<f32>,
    #[prost(int32, optional, tag = "4")]
    pub val_long: Option<i32>,
    #[prost(int32, optional, tag = "5")]
    pub val_short: Option<i32>,
    #[prost(int32, optional, tag = "6")]
    pub val_byte: Option<i32>,
    #[prost(bool, optional, tag = "7")]
    pub val_bool: Option<bool>,
    #[prost(uint64, optional, tag = "8")]
    pub val_uint64: Option<u64>,
}

impl EventKey {
    /// 整数として読める値
    pub fn as_i32(&self) -> Option<i32> {
        self.val_byte
            .or(self.val_short)
            .or(self.val_long)
            .or_else(|| self.val_bool.map(i32::from))
            .or_else(|| self.val_uint64.and_then(|value| i32::try_from(value).ok()))
    }
}

/// svc_GameEvent / GE_Source1LegacyGameEvent
#[derive(Clone, PartialEq, Message)]
pub struct GameEvent {
    #[prost(string, tag = "1")]
    pub event_name: String,
    #[prost(int32, tag = "2")]
    pub event_id: i32,
    #[prost(message, repeated, tag = "3")]
    pub keys: Vec<EventKey>,
}

// ---- Source 2 コンテナ (PBDEMS2) ----

#[derive(Clone, PartialEq, Message)]
pub struct DemoFileHeader {
    #[prost(string, tag = "1")]
    pub demo_file_stamp: String,
    #[prost(int32, tag = "2")]
    pub network_protocol: i32,
    #[prost(string, tag = "3")]
    pub server_name: String,
    #[prost(string, tag = "4")]
    pub client_name: String,
    #[prost(string, tag = "5")]
    pub map_name: String,
    #[prost(string, tag = "6")]
    pub game_directory: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DemoPacket {
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DemoFullPacket {
    #[prost(message, optional, tag = "2")]
    pub packet: Option<DemoPacket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_key_integer_values() {
        let byte = EventKey {
            val_byte: Some(3),
            ..EventKey::default()
        };
        let flag = EventKey {
            val_bool: Some(true),
            ..EventKey::default()
        };
        let text = EventKey {
            val_string: Some("#SFUI_Notice_Round_Win".to_string()),
            ..EventKey::default()
        };

        assert_eq!(byte.as_i32(), Some(3));
        assert_eq!(flag.as_i32(), Some(1));
        assert_eq!(text.as_i32(), None);
    }

    #[test]
    fn test_negative_int32_survives_encoding() {
        let event = GameEvent {
            event_id: 42,
            keys: vec![EventKey {
                r#type: 5,
                val_byte: Some(-1),
                ..EventKey::default()
            }],
            ..GameEvent::default()
        };

        let decoded = GameEvent::decode(event.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.keys[0].as_i32(), Some(-1));
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        // server_tick (4) と passthrough (5) はCS2にしか無い
        let mut bytes = GameEvent {
            event_name: "round_end".to_string(),
            event_id: 7,
            keys: Vec::new(),
        }
        .encode_to_vec();
        bytes.extend_from_slice(&[0x20, 0x80, 0x01, 0x28, 0x02]);

        let decoded = GameEvent::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.event_name, "round_end");
        assert_eq!(decoded.event_id, 7);
    }

    #[test]
    fn test_truncated_message_is_error() {
        let bytes = SetConVar {
            convars: Some(ConVars {
                cvars: vec![ConVar {
                    name: "mp_maxrounds".to_string(),
                    value: "24".to_string(),
                }],
            }),
        }
        .encode_to_vec();

        assert!(SetConVar::decode(&bytes[..bytes.len() - 3]).is_err());
    }
}
