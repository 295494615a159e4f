//! Destinations for unsolicited events.

use std::collections::VecDeque;

use bthal_proto::Event;

/// Receives events read off the socket.
pub trait EventSink {
    fn deliver(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn deliver(&mut self, event: Event) {
        self(event)
    }
}

/// FIFO of events waiting to be displayed.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Remove and return every queued event in arrival order.
    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventQueue {
    fn deliver(&mut self, event: Event) {
        self.events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn event(opcode: u8) -> Event {
        Event {
            service_id: 1,
            opcode,
            payload: Bytes::new(),
        }
    }

    #[test]
    fn queue_preserves_order() {
        let mut queue = EventQueue::new();
        queue.deliver(event(0x81));
        queue.deliver(event(0x85));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().opcode, 0x81);
        assert_eq!(queue.drain(), vec![event(0x85)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |ev: Event| seen.push(ev.opcode);
            sink.deliver(event(0x88));
        }
        assert_eq!(seen, vec![0x88]);
    }
}
