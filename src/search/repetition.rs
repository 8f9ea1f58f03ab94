/// Position keys along the game record and the current search path.
///
/// Nodes push their key on entry and pop it on exit, so the stack always
/// holds the ancestors of the node being searched.
#[derive(Debug, Default, Clone)]
pub struct RepetitionTable {
    keys: Vec<u64>,
}

impl RepetitionTable {
    pub fn new() -> Self {
        Self {
            keys: Vec::with_capacity(256),
        }
    }

    #[inline]
    pub fn push(&mut self, key: u64) {
        self.keys.push(key);
    }

    #[inline]
    pub fn pop(&mut self) {
        self.keys.pop();
    }

    /// True when `key` already sits on the stack twice, so reaching it again
    /// is the third occurrence.
    #[inline]
    pub fn check(&self, key: u64) -> bool {
        self.keys.iter().filter(|&&k| k == key).take(2).count() == 2
    }

    #[inline]
    pub fn count(&self, key: u64) -> usize {
        self.keys.iter().filter(|&&k| k == key).count()
    }

    /// Replaces the stack with the keys of positions already played.
    pub fn load(&mut self, history: &[u64]) {
        self.keys.clear();
        self.keys.extend_from_slice(history);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
