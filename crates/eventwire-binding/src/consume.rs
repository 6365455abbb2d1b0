//! Receive-and-decode loop shared by every binding.
//!
//! The loop is written against the [`Receiver`] trait only, so the same
//! consumer code runs unmodified over the channel and stream bindings.

use eventwire_event::Event;

use crate::cancel::CancelToken;
use crate::error::ConsumeError;
use crate::traits::{Received, Receiver};

/// What to do when a received message fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Stop the loop and return the decode error.
    Fail,
    /// Log the failure and keep receiving.
    Skip,
}

/// Receive messages until end of stream, decoding each into an [`Event`]
/// and passing it to `handler`.
///
/// Returns `Ok(())` when the receiver reports `EndOfStream` (peer closed
/// or `cancel` observed). Transport faults always stop the loop;
/// decode failures stop it only under [`DecodePolicy::Fail`].
pub fn receive_events<R, F>(
    receiver: &mut R,
    cancel: &CancelToken,
    policy: DecodePolicy,
    mut handler: F,
) -> Result<(), ConsumeError>
where
    R: Receiver,
    F: FnMut(Event),
{
    loop {
        let message = match receiver.receive(cancel)? {
            Received::Message(message) => message,
            Received::EndOfStream => return Ok(()),
        };
        match eventwire_codec::decode(&message) {
            Ok(event) => handler(event),
            Err(err) => match policy {
                DecodePolicy::Fail => return Err(ConsumeError::Decode(err)),
                DecodePolicy::Skip => {
                    tracing::warn!(error = %err, "skipping undecodable message");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use eventwire_codec::{Codec, Message};
    use eventwire_event::{ContextAttributes, ContextV02, Event, SpecVersion};
    use url::Url;

    use super::*;
    use crate::error::TransportError;

    struct ScriptedReceiver {
        script: Vec<Result<Received, TransportError>>,
    }

    impl Receiver for ScriptedReceiver {
        fn receive(&mut self, _cancel: &CancelToken) -> Result<Received, TransportError> {
            if self.script.is_empty() {
                Ok(Received::EndOfStream)
            } else {
                self.script.remove(0)
            }
        }
    }

    fn sample_event(id: &str) -> Event {
        let source = Url::parse("http://example.com/source").unwrap();
        Event::new(ContextV02::new(id, source, "com.example.test"))
    }

    fn sample_message(id: &str) -> Message {
        Codec::structured(SpecVersion::V0_2)
            .encode(&sample_event(id))
            .unwrap()
    }

    #[test]
    fn delivers_events_then_stops_at_end_of_stream() {
        let mut receiver = ScriptedReceiver {
            script: vec![
                Ok(Received::Message(sample_message("1"))),
                Ok(Received::Message(sample_message("2"))),
                Ok(Received::EndOfStream),
            ],
        };
        let mut ids = Vec::new();

        receive_events(&mut receiver, &CancelToken::new(), DecodePolicy::Fail, |event| {
            ids.push(event.context.id().to_string());
        })
        .unwrap();

        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn fail_policy_stops_on_undecodable_message() {
        let garbage = Message::structured("application/cloudevents+json", Bytes::from_static(b"[]"));
        let mut receiver = ScriptedReceiver {
            script: vec![Ok(Received::Message(garbage))],
        };

        let result = receive_events(
            &mut receiver,
            &CancelToken::new(),
            DecodePolicy::Fail,
            |_| {},
        );
        assert!(matches!(result, Err(ConsumeError::Decode(_))));
    }

    #[test]
    fn skip_policy_keeps_going_past_undecodable_message() {
        let garbage = Message::structured("application/cloudevents+json", Bytes::from_static(b"[]"));
        let mut receiver = ScriptedReceiver {
            script: vec![
                Ok(Received::Message(garbage)),
                Ok(Received::Message(sample_message("after"))),
                Ok(Received::EndOfStream),
            ],
        };
        let mut ids = Vec::new();

        receive_events(&mut receiver, &CancelToken::new(), DecodePolicy::Skip, |event| {
            ids.push(event.context.id().to_string());
        })
        .unwrap();

        assert_eq!(ids, vec!["after"]);
    }

    #[test]
    fn transport_fault_propagates() {
        let mut receiver = ScriptedReceiver {
            script: vec![Err(TransportError::Closed)],
        };

        let result = receive_events(
            &mut receiver,
            &CancelToken::new(),
            DecodePolicy::Fail,
            |_| {},
        );
        assert!(matches!(
            result,
            Err(ConsumeError::Transport(TransportError::Closed))
        ));
    }
}
