//! Plain-terminal presenter
//!
//! Streams assistant text by printing the suffix each update adds, so a
//! reply grows in place the way the widget's bubble would.

use async_trait::async_trait;
use palaver_engine::{MessageIndex, MessageKind, Presenter, Role};
use parking_lot::Mutex;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

struct Line {
    /// What the engine thinks the message says
    text: String,
    /// What has physically been printed for it
    printed: String,
}

pub struct TermPresenter {
    lines: Mutex<Vec<Line>>,
    /// Index of the message whose line the cursor is still on
    open_line: Mutex<Option<usize>>,
    stdin: tokio::sync::Mutex<BufReader<Stdin>>,
}

impl TermPresenter {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(vec![]),
            open_line: Mutex::new(None),
            stdin: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    fn close_open_line(&self) {
        if self.open_line.lock().take().is_some() {
            println!();
        }
    }

    fn flush() {
        let _ = std::io::stdout().flush();
    }
}

impl Default for TermPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Presenter for TermPresenter {
    async fn add_message(&self, role: Role, text: &str, kind: MessageKind) -> MessageIndex {
        self.close_open_line();
        let mut lines = self.lines.lock();
        let index = lines.len();
        match (role, kind) {
            // a pending placeholder opens the assistant line but prints
            // nothing; updates will fill it in
            (Role::Assistant, MessageKind::Loading) => {
                print!("bot> ");
                lines.push(Line { text: text.to_owned(), printed: String::new() });
                *self.open_line.lock() = Some(index);
            }
            (Role::Assistant, MessageKind::Text) => {
                println!("bot> {}", text);
                lines.push(Line { text: text.to_owned(), printed: text.to_owned() });
            }
            (Role::User, _) => {
                println!("you> {}", text);
                lines.push(Line { text: text.to_owned(), printed: text.to_owned() });
            }
        }
        Self::flush();
        MessageIndex(index)
    }

    async fn update_message(&self, index: MessageIndex, text: &str, _kind: MessageKind) {
        let mut lines = self.lines.lock();
        let Some(line) = lines.get_mut(index.0) else {
            return;
        };
        let on_open_line = *self.open_line.lock() == Some(index.0);
        if on_open_line {
            if let Some(suffix) = text.strip_prefix(line.printed.as_str()) {
                print!("{}", suffix);
            } else {
                // replaced rather than extended (e.g. an error overwrote
                // the pending reply); restart the line
                println!();
                print!("bot> {}", text);
            }
        } else {
            println!("bot> {}", text);
        }
        line.printed = text.to_owned();
        line.text = text.to_owned();
        Self::flush();
    }

    async fn prompt_input(&self, _placeholder: &str, _send_label: &str) -> Option<String> {
        self.close_open_line();
        print!("> ");
        Self::flush();
        let mut line = String::new();
        let mut stdin = self.stdin.lock().await;
        match stdin.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                tracing::debug!("stdin read failed: {}", e);
                None
            }
        }
    }

    async fn begin_working(&self) {
        // the growing reply is its own progress indication in a terminal
    }

    async fn end_working(&self) {}

    async fn clear(&self) {
        self.lines.lock().clear();
        *self.open_line.lock() = None;
    }
}
