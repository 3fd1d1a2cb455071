// Config Source Port
//
// The closing interval is read per auction, so lookups go through this
// port instead of touching the process environment directly.

/// Key/value configuration lookup
pub trait ConfigSource: Send + Sync {
    /// Get the raw value for `key`, or None when unset
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment (production)
pub struct EnvConfigSource;

impl ConfigSource for EnvConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory configuration that tests can change at runtime
    #[derive(Default)]
    pub struct StaticConfigSource {
        values: Mutex<HashMap<String, String>>,
    }

    impl StaticConfigSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(key: &str, value: &str) -> Self {
            let source = Self::new();
            source.set(key, value);
            source
        }

        pub fn set(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        pub fn remove(&self, key: &str) {
            self.values.lock().unwrap().remove(key);
        }
    }

    impl ConfigSource for StaticConfigSource {
        fn get(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }
}
