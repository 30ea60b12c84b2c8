//! Token sources the parser can pull from
//!
//! The plain [`Lexer`] produces tokens on demand. [`ChannelTokens`] runs the
//! same lexer on its own thread and hands tokens over a bounded queue; the
//! producer blocks while the queue is full and the parser blocks while it is
//! empty.

use crate::docs::DocIndex;
use crate::lexer::{Lexer, LexerOptions, Token};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

pub trait TokenSource: Iterator<Item = Token> {
    /// Stop pulling tokens and return the comments collected so far.
    ///
    /// Called once parsing ends, successfully or not. Implementations that
    /// run concurrently drain their remaining output here so the producer can
    /// exit.
    fn finish(self) -> DocIndex;
}

impl TokenSource for Lexer<'_> {
    fn finish(self) -> DocIndex {
        self.into_docs()
    }
}

pub struct ChannelTokens {
    receiver: Option<Receiver<Token>>,
    handle: Option<JoinHandle<DocIndex>>,
}

impl ChannelTokens {
    /// Start a lexer thread feeding a queue of at most `capacity` tokens.
    /// A capacity of zero makes every hand-off a rendezvous.
    pub fn spawn(input: String, options: LexerOptions, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let handle = thread::spawn(move || {
            let mut lexer = Lexer::with_options(&input, options);
            for token in lexer.by_ref() {
                if sender.send(token).is_err() {
                    break;
                }
            }
            lexer.into_docs()
        });
        Self { receiver: Some(receiver), handle: Some(handle) }
    }

    fn shutdown(&mut self) -> DocIndex {
        if let Some(receiver) = self.receiver.take() {
            let drained = receiver.iter().count();
            if drained > 0 {
                log::debug!("drained {} unread tokens", drained);
            }
        }
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(docs)) => docs,
            Some(Err(_)) => {
                log::warn!("lexer thread panicked; documentation comments are lost");
                DocIndex::new()
            }
            None => DocIndex::new(),
        }
    }
}

impl Iterator for ChannelTokens {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.receiver.as_ref()?.recv().ok()
    }
}

impl TokenSource for ChannelTokens {
    fn finish(mut self) -> DocIndex {
        self.shutdown()
    }
}

impl Drop for ChannelTokens {
    fn drop(&mut self) {
        if self.receiver.is_some() {
            self.shutdown();
        }
    }
}
