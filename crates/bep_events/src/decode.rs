use prost::Message;

use crate::error::DecodeError;
use crate::proto::BuildEvent;

/// Turns one frame body into a build event.
///
/// Implementations may drop fields they do not recognise; they should only
/// fail when the body is not a message at all.
pub trait MessageDecoder {
    fn decode(&mut self, body: &[u8]) -> Result<BuildEvent, DecodeError>;
}

/// Protobuf decoder for the modelled schema subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProstDecoder;

impl ProstDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl MessageDecoder for ProstDecoder {
    fn decode(&mut self, body: &[u8]) -> Result<BuildEvent, DecodeError> {
        Ok(BuildEvent::decode(body)?)
    }
}

impl<F> MessageDecoder for F
where
    F: FnMut(&[u8]) -> Result<BuildEvent, DecodeError>,
{
    fn decode(&mut self, body: &[u8]) -> Result<BuildEvent, DecodeError> {
        self(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventPayload;
    use crate::proto::{build_event, Progress};

    #[test]
    fn empty_body_is_an_empty_event() {
        let event = ProstDecoder::new().decode(&[]).unwrap();
        assert!(event.id.is_none());
        assert!(event.payload.is_none());
        assert!(!event.last_message);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let event = BuildEvent {
            id: None,
            last_message: true,
            payload: Some(build_event::Payload::Progress(Progress::default())),
        };
        let mut body = event.encode_to_vec();
        // field 99, varint wire type, value 1
        body.extend_from_slice(&[0x98, 0x06, 0x01]);

        let decoded = ProstDecoder::new().decode(&body).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn target_configured_uses_upstream_field_numbers() {
        let mut body = Vec::new();
        // id (1) -> target_configured (16) -> label (1) "//a:b"
        body.extend_from_slice(&[0x0a, 0x0a, 0x82, 0x01, 0x07, 0x0a, 0x05]);
        body.extend_from_slice(b"//a:b");
        // configured (18) -> target_kind (1) "cc_binary"
        body.extend_from_slice(&[0x92, 0x01, 0x0b, 0x0a, 0x09]);
        body.extend_from_slice(b"cc_binary");

        let decoded = ProstDecoder::new().decode(&body).unwrap();
        let event = crate::classify::classify(decoded, &body);
        assert_eq!(event.label, "//a:b");
        assert_eq!(
            event.payload,
            EventPayload::Configured {
                target_kind: "cc_binary".to_string()
            }
        );
        assert_eq!(
            crate::render::render_event(&event).as_deref(),
            Some("  ◇ Target configured: //a:b")
        );
    }

    #[test]
    fn garbage_body_is_rejected() {
        // field 1 declared as length-delimited with a length past the end
        assert!(ProstDecoder::new().decode(&[0x0a, 0x05, 0x01]).is_err());
    }
}
