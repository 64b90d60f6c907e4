//! Newline-delimited JSON decoding for the runtime's streaming replies.

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::ServiceError;
use crate::upstream::RuntimeStream;

/// The runtime's `{"error": ...}` message, if `value` is one.
pub(crate) fn reported_error(value: &serde_json::Value) -> Option<String> {
    value.get("error").map(|error| match error.as_str() {
        Some(message) => message.to_string(),
        None => error.to_string(),
    })
}

/// Parse one JSON document, turning an `{"error": ...}` reply into
/// [`ServiceError::Upstream`].
pub(crate) fn parse_reply<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ServiceError> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;
    if let Some(message) = reported_error(&value) {
        return Err(ServiceError::Upstream(message));
    }
    Ok(serde_json::from_value(value)?)
}

struct LineState<S> {
    stream: S,
    buf: BytesMut,
    done: bool,
}

/// Split a byte stream into lines and decode each as `T`, in arrival order.
///
/// The stream ends after the first failure, whether it came from the
/// transport, a malformed line, or an error reported by the runtime.
pub fn decode_lines<S, E, T>(bytes: S) -> RuntimeStream<T>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ServiceError> + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let state = LineState {
        stream: bytes.boxed(),
        buf: BytesMut::new(),
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(pos) = st.buf.iter().position(|&b| b == b'\n') {
                let line = st.buf.split_to(pos + 1);
                let line = line.trim_ascii();
                if line.is_empty() {
                    continue;
                }
                let item = parse_reply::<T>(line);
                st.done = item.is_err();
                return Some((item, st));
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    st.done = true;
                    return Some((Err(err.into()), st));
                }
                None => {
                    // A final line without a trailing newline still counts.
                    st.done = true;
                    let rest = st.buf.split();
                    let rest = rest.trim_ascii();
                    if rest.is_empty() {
                        return None;
                    }
                    let item = parse_reply::<T>(rest);
                    return Some((item, st));
                }
            }
        }
    })
    .boxed()
}
