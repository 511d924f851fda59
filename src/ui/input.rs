use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Where the session reads its answers from.
#[async_trait]
pub trait InputSource: Send {
    /// Next line without its terminator, or `None` once input is exhausted.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Preloaded answers, for batch runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_input_drains_in_order() {
        let mut input = ScriptedInput::new(["https://example.com/a.txt", "3"]);
        assert_eq!(
            input.next_line().await.unwrap().as_deref(),
            Some("https://example.com/a.txt")
        );
        assert_eq!(input.next_line().await.unwrap().as_deref(), Some("3"));
        assert_eq!(input.next_line().await.unwrap(), None);
    }
}
