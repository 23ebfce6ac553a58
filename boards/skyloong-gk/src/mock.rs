//! In-memory transport recording every written report.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use skyloong_sync_core::{BoardError, Result};

use crate::transport::Transport;

#[derive(Default)]
struct State {
    writes: Vec<Vec<u8>>,
    responses: VecDeque<Vec<u8>>,
    failures: usize,
    truncate: Option<usize>,
}

#[derive(Clone, Default)]
pub struct MockTransport(Arc<Mutex<State>>);

impl MockTransport {
    /// A transport that answers the info query with `model_id`
    pub fn with_model(model_id: u32) -> Self {
        let mock = Self::default();
        let mut response = vec![0u8; 64];
        response[0] = 0x01;
        response[1] = 0x08;
        response[8..12].copy_from_slice(&model_id.to_le_bytes());
        mock.respond(response);
        mock
    }

    pub fn respond(&self, response: Vec<u8>) {
        self.0.lock().unwrap().responses.push_back(response);
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.0.lock().unwrap().failures = count;
    }

    pub fn truncate_writes(&self, len: usize) {
        self.0.lock().unwrap().truncate = Some(len);
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().writes.clone()
    }

    /// (command, sub-command) of every write so far
    pub fn commands(&self) -> Vec<(u8, u8)> {
        self.writes().iter().map(|w| (w[1], w[2])).collect()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.0.lock().unwrap();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(BoardError::Io(io::Error::other("mock write failure")));
        }
        if let Some(len) = state.truncate {
            return Ok(len.min(data.len()));
        }
        state.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.0.lock().unwrap();
        match state.responses.pop_front() {
            Some(response) => {
                let len = response.len().min(buf.len());
                buf[..len].copy_from_slice(&response[..len]);
                Ok(len)
            },
            None => Ok(0),
        }
    }
}
