//! Watch event stream driver.
//!
//! Reads newline-delimited Kubernetes watch events
//! (`{"type":"ADDED","object":{...}}`) and feeds them to an
//! [`EventHandler`]. A small cache of the last state seen per instance
//! supplies the `old` side of updates, the way an informer would: an
//! `ADDED` for a known instance becomes an update, a `MODIFIED` for an
//! unknown one becomes an add.

use std::collections::HashMap;
use std::io::BufRead;

use serde::Deserialize;

use crate::object::{InstanceId, TrackedObject, TypeDescriptor};
use crate::store::EventHandler;

/// Watch event type, as sent by the API server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Modified,
    Deleted,
    Bookmark,
    Error,
}

/// One line of a watch stream.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub object: TrackedObject,
}

impl WatchEvent {
    /// Parse a single stream line.
    ///
    /// # Errors
    /// Returns the JSON error if the line is not a watch event.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Counters reported after a stream ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Events handed to the handler.
    pub dispatched: usize,
    /// Bookmarks and error events.
    pub ignored: usize,
    /// Lines that were not watch events.
    pub malformed: usize,
}

type CacheKey = (TypeDescriptor, InstanceId);

/// Routes watch events to an [`EventHandler`].
pub struct Dispatcher<'h, H: EventHandler + ?Sized> {
    handler: &'h H,
    last_seen: HashMap<CacheKey, TrackedObject>,
}

impl<'h, H: EventHandler + ?Sized> Dispatcher<'h, H> {
    pub fn new(handler: &'h H) -> Self {
        Self {
            handler,
            last_seen: HashMap::new(),
        }
    }

    /// Deliver one event. Returns `false` if the event was ignored.
    pub fn dispatch(&mut self, event: WatchEvent) -> bool {
        let WatchEvent { event_type, object } = event;
        let key = cache_key(&object);

        match event_type {
            EventType::Added | EventType::Modified => {
                let previous = key
                    .clone()
                    .and_then(|k| self.last_seen.insert(k, object.clone()));
                match previous {
                    Some(old) => self.handler.on_update(&old, &object),
                    None => self.handler.on_add(&object),
                }
            }
            EventType::Deleted => {
                if let Some(k) = &key {
                    self.last_seen.remove(k);
                }
                self.handler.on_delete(&object);
            }
            EventType::Bookmark => return false,
            EventType::Error => {
                tracing::warn!(status = %object.as_value(), "watch reported an error");
                return false;
            }
        }
        true
    }

    /// Drain `reader` line by line until end of input.
    ///
    /// # Errors
    /// Returns an I/O error only if reading fails; bad lines are logged and
    /// skipped.
    pub fn run<B: BufRead>(&mut self, reader: B) -> std::io::Result<StreamStats> {
        let mut stats = StreamStats::default();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match WatchEvent::parse(&line) {
                Ok(event) => {
                    if self.dispatch(event) {
                        stats.dispatched += 1;
                    } else {
                        stats.ignored += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(line = n + 1, error = %e, "skipping malformed watch event");
                    stats.malformed += 1;
                }
            }
        }
        Ok(stats)
    }
}

fn cache_key(obj: &TrackedObject) -> Option<CacheKey> {
    Some((obj.type_descriptor().ok()?, obj.instance()?))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    fn label(obj: &TrackedObject) -> String {
        obj.as_value()["data"]["v"].as_str().unwrap_or("-").to_owned()
    }

    impl EventHandler for Recorder {
        fn on_add(&self, obj: &TrackedObject) {
            self.calls.borrow_mut().push(format!("add {}", label(obj)));
        }
        fn on_update(&self, old: &TrackedObject, new: &TrackedObject) {
            self.calls
                .borrow_mut()
                .push(format!("update {}->{}", label(old), label(new)));
        }
        fn on_delete(&self, obj: &TrackedObject) {
            self.calls.borrow_mut().push(format!("delete {}", label(obj)));
        }
    }

    fn line(event_type: &str, name: &str, v: &str) -> String {
        json!({
            "type": event_type,
            "object": {
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {"name": name, "namespace": "default"},
                "data": {"v": v},
            }
        })
        .to_string()
    }

    #[test]
    fn parses_event_types() {
        let event = WatchEvent::parse(&line("MODIFIED", "a", "1")).unwrap();
        assert_eq!(event.event_type, EventType::Modified);
        assert!(WatchEvent::parse(r#"{"type":"RESYNC","object":{}}"#).is_err());
    }

    #[test]
    fn updates_carry_previous_state() {
        let recorder = Recorder::default();
        let input = [
            line("ADDED", "a", "1"),
            line("MODIFIED", "a", "2"),
            line("DELETED", "a", "2"),
            line("MODIFIED", "a", "3"),
        ]
        .join("\n");

        let stats = Dispatcher::new(&recorder).run(input.as_bytes()).unwrap();
        assert_eq!(stats.dispatched, 4);
        assert_eq!(
            *recorder.calls.borrow(),
            ["add 1", "update 1->2", "delete 2", "add 3"]
        );
    }

    #[test]
    fn instances_are_tracked_separately() {
        let recorder = Recorder::default();
        let input = [line("ADDED", "a", "1"), line("ADDED", "b", "2"), line("ADDED", "a", "3")]
            .join("\n");
        Dispatcher::new(&recorder).run(input.as_bytes()).unwrap();
        assert_eq!(*recorder.calls.borrow(), ["add 1", "add 2", "update 1->3"]);
    }

    #[test]
    fn bookmarks_errors_and_garbage_are_skipped() {
        let recorder = Recorder::default();
        let input = format!(
            "{}\n\n{}\nnot json\n{}\n",
            r#"{"type":"BOOKMARK","object":{"metadata":{"resourceVersion":"12"}}}"#,
            r#"{"type":"ERROR","object":{"kind":"Status","code":410}}"#,
            line("ADDED", "a", "1"),
        );
        let stats = Dispatcher::new(&recorder).run(input.as_bytes()).unwrap();
        assert_eq!(
            stats,
            StreamStats {
                dispatched: 1,
                ignored: 2,
                malformed: 1,
            }
        );
        assert_eq!(*recorder.calls.borrow(), ["add 1"]);
    }

    #[test]
    fn unnamed_objects_are_still_delivered() {
        let recorder = Recorder::default();
        let input = r#"{"type":"MODIFIED","object":{"kind":"Node","data":{"v":"x"}}}"#;
        Dispatcher::new(&recorder).run(input.as_bytes()).unwrap();
        assert_eq!(*recorder.calls.borrow(), ["add x"]);
    }
}
