//! Shared fakes for integration tests.
//!
//! `FakeNetwork` stands in for the SSH connector: each known host replays a
//! fixed list of reads, unknown hosts refuse the connection. Every connect,
//! send and close is recorded.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::rc::Rc;

use devrun::credentials::Credentials;
use devrun::devices::Target;
use devrun::prompt::{PromptError, Prompter};
use devrun::ssh::{Connector, SessionError, SessionErrorKind, ShellChannel, Transport};

/// Something a fake device did or had done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(String),
    Send(String, Vec<u8>),
    Close(String),
}

type EventLog = Rc<RefCell<Vec<Event>>>;

/// In-memory network of scripted devices.
#[derive(Default)]
pub struct FakeNetwork {
    devices: HashMap<String, Vec<Vec<u8>>>,
    pub events: EventLog,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reachable device that answers the two session reads in order.
    pub fn device(mut self, host: &str, banner: &str, reply: &str) -> Self {
        self.devices.insert(
            host.to_string(),
            vec![banner.as_bytes().to_vec(), reply.as_bytes().to_vec()],
        );
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.borrow().iter().filter(|e| *e == wanted).count()
    }

    pub fn sent_to(&self, host: &str) -> Vec<Vec<u8>> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Send(h, data) if h == host => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Connector for FakeNetwork {
    type Transport = FakeTransport;

    fn connect(&self, target: &Target, _: &Credentials) -> Result<FakeTransport, SessionError> {
        let host = target.host().to_string();
        self.events.borrow_mut().push(Event::Connect(host.clone()));
        match self.devices.get(&host) {
            Some(replies) => Ok(FakeTransport {
                host,
                replies: replies.clone(),
                events: Rc::clone(&self.events),
            }),
            None => Err(SessionError::new(
                SessionErrorKind::Connect,
                "Connection refused (os error 111)",
            )),
        }
    }
}

pub struct FakeTransport {
    host: String,
    replies: Vec<Vec<u8>>,
    events: EventLog,
}

impl Transport for FakeTransport {
    type Shell = FakeShell;

    fn open_shell(&mut self) -> Result<FakeShell, SessionError> {
        Ok(FakeShell {
            host: self.host.clone(),
            replies: std::mem::take(&mut self.replies).into(),
            events: Rc::clone(&self.events),
        })
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.events.borrow_mut().push(Event::Close(self.host.clone()));
        Ok(())
    }
}

pub struct FakeShell {
    host: String,
    replies: VecDeque<Vec<u8>>,
    events: EventLog,
}

impl ShellChannel for FakeShell {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.events
            .borrow_mut()
            .push(Event::Send(self.host.clone(), data.to_vec()));
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.replies.pop_front() {
            Some(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

/// Prompter that replays canned answers and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            ..Self::default()
        }
    }

    fn next(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or(PromptError::Interrupted)
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.next(prompt)
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.next(prompt)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
