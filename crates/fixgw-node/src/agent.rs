//! The agent runner (§5): every role and every session is a cooperative
//! work unit with a `poll(now_ms) -> work_count` entry point. Agents are
//! composed onto OS threads; within a thread they're invoked round-robin,
//! never blocking and never sharing mutable state with agents on another
//! thread. No async runtime, matching the teacher's design note that its
//! own per-core runtime uses "plain synchronous threads".

use std::thread;
use std::time::Duration;

use crate::shutdown::ShutdownFlag;

/// A cooperative work unit. `poll` must be non-blocking and bounded; it
/// returns the amount of work it did so the runner can decide whether to
/// spin again immediately or back off.
pub trait Agent: Send {
    fn name(&self) -> &str;
    fn poll(&mut self, now_ms: i64) -> usize;
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Groups of agents, one group per OS thread. Within a group, agents are
/// polled round-robin in a tight loop; a group that did no work across a
/// full round sleeps briefly before trying again.
pub struct AgentRunner {
    groups: Vec<Vec<Box<dyn Agent>>>,
    idle_sleep: Duration,
}

impl AgentRunner {
    pub fn new(idle_sleep: Duration) -> Self {
        Self {
            groups: Vec::new(),
            idle_sleep,
        }
    }

    /// Assigns a new group of agents to its own dedicated thread.
    pub fn add_group(&mut self, agents: Vec<Box<dyn Agent>>) {
        self.groups.push(agents);
    }

    /// Spawns one thread per group and blocks until `shutdown` is
    /// observed, then joins every thread.
    pub fn run(self, shutdown: ShutdownFlag) {
        let mut handles = Vec::with_capacity(self.groups.len());

        for (index, mut agents) in self.groups.into_iter().enumerate() {
            let shutdown = shutdown.clone();
            let idle_sleep = self.idle_sleep;
            let handle = thread::Builder::new()
                .name(format!("fixgw-agent-{index}"))
                .spawn(move || {
                    while !shutdown.is_set() {
                        let now = now_ms();
                        let mut work = 0;
                        for agent in &mut agents {
                            work += agent.poll(now);
                        }
                        if work == 0 {
                            thread::sleep(idle_sleep);
                        }
                    }
                    tracing::info!(thread = %format!("fixgw-agent-{index}"), "agent group stopped");
                })
                .expect("failed to spawn agent thread");
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAgent {
        polls: Arc<AtomicUsize>,
        stop_after: usize,
        shutdown: ShutdownFlag,
    }

    impl Agent for CountingAgent {
        fn name(&self) -> &str {
            "counting"
        }

        fn poll(&mut self, _now_ms: i64) -> usize {
            let count = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if count >= self.stop_after {
                self.shutdown.set();
            }
            1
        }
    }

    #[test]
    fn runner_polls_agent_until_shutdown() {
        let shutdown = ShutdownFlag::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let agent = CountingAgent {
            polls: Arc::clone(&polls),
            stop_after: 5,
            shutdown: shutdown.clone(),
        };

        let mut runner = AgentRunner::new(Duration::from_millis(1));
        runner.add_group(vec![Box::new(agent)]);
        runner.run(shutdown);

        assert!(polls.load(Ordering::SeqCst) >= 5);
    }

    #[test]
    fn runner_with_no_groups_returns_immediately() {
        let shutdown = ShutdownFlag::new();
        shutdown.set();
        let runner = AgentRunner::new(Duration::from_millis(1));
        runner.run(shutdown);
    }
}
