use std::time::{Duration, Instant};

use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    pub fn color(&self) -> Color {
        match self {
            Level::Info => Color::Green,
            Level::Error => Color::Red,
        }
    }
}

/// Status bar message that disappears after `duration`.
#[derive(Debug)]
pub struct TimedString {
    content: String,
    level: Level,
    timestamp: Instant,
    duration: Duration,
}

impl TimedString {
    pub fn new(content: &str, duration: Duration) -> Self {
        Self {
            content: content.to_string(),
            level: Level::Info,
            duration,
            timestamp: Instant::now(),
        }
    }

    pub fn set(&mut self, content: impl Into<String>, level: Level) {
        self.content = content.into();
        self.level = level;
        self.timestamp = Instant::now();
    }

    pub fn info(&mut self, content: impl Into<String>) {
        self.set(content, Level::Info);
    }

    pub fn error(&mut self, content: impl Into<String>) {
        self.set(content, Level::Error);
    }

    pub fn level(&self) -> Level {
        self.level
    }

    fn expired(&self) -> bool {
        self.timestamp.elapsed() > self.duration
    }
}

impl AsRef<str> for TimedString {
    fn as_ref(&self) -> &str {
        if self.expired() { "" } else { &self.content }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires() {
        let mut s = TimedString::new("", Duration::from_millis(30));
        s.error("boom");
        assert_eq!(s.as_ref(), "boom");
        assert_eq!(s.level(), Level::Error);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(s.as_ref(), "");
    }
}
