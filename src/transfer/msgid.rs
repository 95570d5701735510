use rand::Rng;
use rand::distributions::Alphanumeric;

const RANDOM_ID_LEN: usize = 16;

/// Source of message-ids for posted articles
///
/// Ids are returned without angle brackets. Any `FnMut() -> String` closure
/// is a generator, which keeps tests deterministic.
pub trait MessageIdGenerator {
    /// Id for the next article; must differ from every earlier id
    fn next_id(&mut self) -> String;
}

impl<F: FnMut() -> String> MessageIdGenerator for F {
    fn next_id(&mut self) -> String {
        self()
    }
}

/// 16 random alphanumeric characters followed by a fixed domain suffix
#[derive(Debug, Clone)]
pub struct RandomMessageId {
    domain: String,
}

impl RandomMessageId {
    /// `domain` is appended as-is, so it normally starts with `@`
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl MessageIdGenerator for RandomMessageId {
    fn next_id(&mut self) -> String {
        let mut id: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_ID_LEN)
            .map(char::from)
            .collect();
        id.push_str(&self.domain);
        id
    }
}
