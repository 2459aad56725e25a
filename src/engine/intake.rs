// src/engine/intake.rs
// =============================================================================
// The drain loop: moves tasks from the unbounded intake channel onto the
// bounded dispatch channel the workers read from.
//
// Submitters never wait on workers: `Engine::submit` pushes into an unbounded
// channel and returns. This loop owns a local FIFO buffer and:
// 1. Pushes as many buffered tasks as the dispatch channel accepts right now
//    (non-blocking `try_send`, stops at the first "full")
// 2. If nothing is buffered, sleeps on the intake channel
// 3. Otherwise sleeps until either a new task arrives or the dispatch channel
//    has room again, whichever comes first
//
// Nothing here spins: every wait is on a channel. The buffer is only ever
// touched by this task.
//
// The loop ends when the intake channel is closed and everything it held has
// been forwarded. Dropping `dispatch` on return closes the dispatch channel,
// which is what tells the workers to stop.
// =============================================================================

use super::Task;
use std::collections::VecDeque;
use tokio::sync::mpsc::{self, error::TrySendError};

pub(crate) async fn drain(mut intake: mpsc::UnboundedReceiver<Task>, dispatch: mpsc::Sender<Task>) {
    let mut buffered: VecDeque<Task> = VecDeque::new();
    let mut intake_open = true;

    loop {
        if flush(&mut buffered, &dispatch).is_err() {
            break;
        }

        if buffered.is_empty() {
            if !intake_open {
                break;
            }
            match intake.recv().await {
                Some(task) => buffered.push_back(task),
                None => intake_open = false,
            }
            continue;
        }

        tokio::select! {
            incoming = intake.recv(), if intake_open => match incoming {
                Some(task) => buffered.push_back(task),
                None => intake_open = false,
            },
            permit = dispatch.reserve() => match permit {
                Ok(permit) => {
                    if let Some(task) = buffered.pop_front() {
                        permit.send(task);
                    }
                }
                Err(_) => break,
            },
        }
    }

    if !buffered.is_empty() {
        tracing::warn!(dropped = buffered.len(), "dispatch channel closed with tasks still buffered");
    }
    tracing::debug!("intake drain loop finished");
}

// Forwards buffered tasks in order until the dispatch channel is full.
// Err means the workers are gone and nothing can be forwarded any more.
fn flush(buffered: &mut VecDeque<Task>, dispatch: &mpsc::Sender<Task>) -> Result<(), ()> {
    while let Some(task) = buffered.pop_front() {
        match dispatch.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(task)) => {
                buffered.push_front(task);
                return Ok(());
            }
            Err(TrySendError::Closed(task)) => {
                buffered.push_front(task);
                return Err(());
            }
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why two channels?
//    - The intake side must accept work at any time, even from a handler
//      running on a worker while every worker is busy
//    - The dispatch side must be bounded so workers pull at their own pace
//    - A bounded channel alone would make a handler wait on its own pool
//
// 2. Why select! on reserve()?
//    - reserve() resolves once the dispatch channel has a free slot, without
//      giving up a task if the other branch wins
//    - recv() is cancel safe too, so losing the race loses nothing
//
// 3. Ordering
//    - Tasks leave in the order they arrived: pop_front on send, push_front
//      when a try_send bounces
// -----------------------------------------------------------------------------
