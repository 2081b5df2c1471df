use std::collections::HashMap;

/// A named cookie payload to benchmark.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    input: TestInput,
}

impl TestCase {
    pub const fn new(name: &'static str, input: TestInput) -> Self {
        Self { name, input }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn input(&self) -> &TestInput {
        &self.input
    }
}

/// Cookie values as `key=value` pairs separated by `&`, the way they are stored.
#[derive(Debug, Copy, Clone)]
pub struct TestInput {
    pairs: &'static str,
}

impl TestInput {
    pub const fn new(pairs: &'static str) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn values(&self) -> HashMap<String, String> {
        self.pairs
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect()
    }
}
