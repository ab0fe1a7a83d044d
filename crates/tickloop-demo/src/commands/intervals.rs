//! `tickloop-demo intervals`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tickloop::{EventLoopThread, Executor, LoopConfig, LoopEnqueuer, LoopThread};

/// Messages printed by the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// The single delayed message
    Delayed,
    /// The slow interval; chains a `FollowUp`
    Slow,
    /// Immediate task enqueued by `Slow`
    FollowUp,
    /// The fast interval
    Fast,
}

/// Prints each message and counts it
#[derive(Default)]
pub struct Printer {
    counts: [AtomicUsize; 4],
    quiet: bool,
}

impl Printer {
    #[cfg(test)]
    fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// How many times `message` has run
    pub fn count(&self, message: Message) -> usize {
        self.counts[message as usize].load(Ordering::Relaxed)
    }
}

impl Executor for Printer {
    type Task = Message;

    fn execute(&self, task: Message) {
        self.counts[task as usize].fetch_add(1, Ordering::Relaxed);
        if self.quiet {
            return;
        }
        match task {
            Message::Delayed => println!("This message appears once, after two periods."),
            Message::Slow => println!("This message appears every period."),
            Message::FollowUp => println!("This message appears right after the every-period one."),
            Message::Fast => println!("This message appears every three quarters of a period."),
        }
    }

    fn execute_on_loop(&self, task: Message, enqueuer: &LoopEnqueuer<'_, Message>) {
        self.execute(task);
        if task == Message::Slow {
            enqueuer.enqueue(Message::FollowUp);
        }
    }
}

/// Run the scenario and hand back the loop's final counts
pub fn run(
    config: LoopConfig,
    printer: Printer,
    period: Duration,
    duration: Duration,
) -> anyhow::Result<EventLoopThread<Printer>> {
    let event_loop: EventLoopThread<Printer> = LoopThread::with_config(printer, config);
    event_loop.start()?;

    event_loop.enqueue_delayed(Message::Delayed, period * 2);
    let slow = event_loop.enqueue_interval(Message::Slow, period);
    let fast = event_loop.enqueue_interval(Message::Fast, period * 3 / 4);

    thread::sleep(duration);
    slow.cancel();
    fast.cancel();
    event_loop.stop();

    Ok(event_loop)
}

pub fn execute(config: LoopConfig, period_ms: u64, duration_ms: u64) -> anyhow::Result<()> {
    let event_loop = run(
        config,
        Printer::default(),
        Duration::from_millis(period_ms),
        Duration::from_millis(duration_ms),
    )?;

    let printer = event_loop.executor();
    println!(
        "delayed: {}, every period: {}, follow-ups: {}, fast: {}",
        printer.count(Message::Delayed),
        printer.count(Message::Slow),
        printer.count(Message::FollowUp),
        printer.count(Message::Fast),
    );
    Ok(())
}
