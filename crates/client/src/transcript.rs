use std::collections::HashMap;
use std::fmt::{self, Display};

use chrono::{DateTime, Local};

/// Identifies a message within one transcript.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// A message displayed in the chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Local>,
    /// Whether the text is still being streamed in.
    pub in_progress: bool,
}

/// The ordered list of messages of a chat, kept in memory only.
///
/// Messages are addressed by their [`MessageId`] and never mutated in
/// place: [`Transcript::update`] swaps in a rebuilt value.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
    next_id: u64,
}

impl Transcript {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript opened by an assistant message.
    pub fn with_greeting<S: Into<String>>(greeting: S) -> Self {
        let mut transcript = Self::new();
        transcript.push(greeting.into(), false, false);
        transcript
    }

    /// Appends a message written by the user.
    #[inline]
    pub fn push_user<S: Into<String>>(&mut self, text: S) -> MessageId {
        self.push(text.into(), true, false)
    }

    /// Appends an empty assistant message that will be streamed into.
    #[inline]
    pub fn push_placeholder(&mut self) -> MessageId {
        self.push(String::new(), false, true)
    }

    fn push(
        &mut self,
        text: String,
        is_user: bool,
        in_progress: bool,
    ) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.messages.len());
        self.messages.push(Message {
            id,
            text,
            is_user,
            timestamp: Local::now(),
            in_progress,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).map(|&idx| &self.messages[idx])
    }

    /// Replaces the message `id` with the value built by `f`.
    ///
    /// The identifier always survives the update. Returns `false` if no such
    /// message exists.
    pub fn update(
        &mut self,
        id: MessageId,
        f: impl FnOnce(&Message) -> Message,
    ) -> bool {
        let Some(&idx) = self.index.get(&id) else {
            return false;
        };
        let updated = Message {
            id,
            ..f(&self.messages[idx])
        };
        self.messages[idx] = updated;
        true
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_lookup() {
        let mut transcript = Transcript::with_greeting("Hello!");
        let user = transcript.push_user("Hi");
        let reply = transcript.push_placeholder();

        let order: Vec<_> = transcript.iter().map(|m| m.id).collect();
        assert_eq!(order.len(), 3);
        assert_eq!(&order[1..], [user, reply]);

        let greeting = transcript.iter().next().unwrap();
        assert!(!greeting.is_user && !greeting.in_progress);
        assert!(transcript.get(user).unwrap().is_user);
        assert!(transcript.get(reply).unwrap().in_progress);
        assert!(transcript.get(reply).unwrap().text.is_empty());
    }

    #[test]
    fn test_update() {
        let mut transcript = Transcript::new();
        let first = transcript.push_placeholder();
        let second = transcript.push_user("untouched");

        assert!(transcript.update(first, |msg| Message {
            text: "streamed".to_owned(),
            in_progress: false,
            ..msg.clone()
        }));
        let msg = transcript.get(first).unwrap();
        assert_eq!(msg.text, "streamed");
        assert!(!msg.in_progress);
        assert_eq!(transcript.get(second).unwrap().text, "untouched");
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_update_keeps_id() {
        let mut transcript = Transcript::new();
        let first = transcript.push_user("a");
        let second = transcript.push_user("b");
        transcript.update(first, |_| message_with_id(second));
        assert_eq!(transcript.get(first).unwrap().id, first);
    }

    #[test]
    fn test_update_missing() {
        let mut other = Transcript::new();
        other.push_user("x");
        let stranger = other.push_user("y");

        let mut transcript = Transcript::new();
        transcript.push_user("only one");
        assert!(!transcript.update(stranger, |msg| msg.clone()));
    }

    fn message_with_id(id: MessageId) -> Message {
        Message {
            id,
            text: "b".to_owned(),
            is_user: true,
            timestamp: Local::now(),
            in_progress: false,
        }
    }
}
